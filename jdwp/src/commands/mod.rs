pub mod array_reference;
pub mod array_type;
pub mod class_loader_reference;
pub mod class_object_reference;
pub mod class_type;
pub mod event;
pub mod event_request;
pub mod interface_type;
pub mod method;
pub mod object_reference;
pub mod reference_type;
pub mod stack_frame;
pub mod string_reference;
pub mod thread_group_reference;
pub mod thread_reference;
pub mod virtual_machine;

use crate::{
    codec::{JdwpReadable, JdwpWritable},
    CommandId,
};

pub(crate) use jdwp_macros::jdwp_command;

/// A single JDWP command, tied to its reply type and wire command id.
pub trait Command: JdwpWritable {
    const ID: CommandId;
    type Output: JdwpReadable;
}
