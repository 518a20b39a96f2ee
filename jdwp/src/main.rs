use std::error::Error;

use jdwp::client::JdwpClient;
use jdwp::commands::virtual_machine;

// this is some CRAZY TESTING fyi
pub fn main() -> Result<(), Box<dyn Error>> {
    let client = JdwpClient::connect(("localhost", 1044))?;

    let version = client.send(virtual_machine::Version)?;
    println!("{version:#?}");

    client.send(virtual_machine::Exit::new(0))?;

    Ok(())
}
