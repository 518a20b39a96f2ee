#![allow(dead_code)]

extern crate self as jdwp;

use crate::{
    codec::{JdwpReadable, JdwpReader, JdwpWritable, JdwpWriter},
    enums::{ErrorCode, Flags},
};

mod codec;
mod functional;
mod jvm;

pub mod client;
pub mod commands;
pub mod enums;
pub mod types;

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, JdwpReadable, JdwpWritable)]
pub struct CommandId {
    command_set: u8,
    command: u8,
}

impl CommandId {
    pub(crate) const fn new(command_set: u8, command: u8) -> CommandId {
        CommandId {
            command_set,
            command,
        }
    }
}

#[derive(Copy, Clone)]
enum PacketMeta {
    Command(CommandId),
    Reply(ErrorCode),
}

#[derive(Copy, Clone)]
pub struct PacketHeader {
    length: u32,
    id: u32,
    flags: Flags,
    meta: PacketMeta,
}

impl JdwpReadable for PacketHeader {
    fn read<R: std::io::Read>(read: &mut JdwpReader<R>) -> std::io::Result<Self> {
        let length = u32::read(read)?;
        let id = u32::read(read)?;
        let flags = Flags::read(read)?;
        let meta = match flags {
            Flags::Command => PacketMeta::Command(CommandId::read(read)?),
            Flags::Reply => PacketMeta::Reply(ErrorCode::read(read)?),
        };
        Ok(PacketHeader {
            length,
            id,
            flags,
            meta,
        })
    }
}

impl JdwpWritable for PacketHeader {
    fn write<W: std::io::Write>(&self, write: &mut JdwpWriter<W>) -> std::io::Result<()> {
        self.length.write(write)?;
        self.id.write(write)?;
        self.flags.write(write)?;
        match self.meta {
            PacketMeta::Command(id) => id.write(write),
            PacketMeta::Reply(error_code) => error_code.write(write),
        }
    }
}

pub struct Packet<'a> {
    header: &'a PacketHeader,
    data: &'a [u8],
}
