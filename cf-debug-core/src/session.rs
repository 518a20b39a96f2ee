//! A cheaply cloneable handle to one [`JdwpClient`] connection, shared across
//! the event pump, the façade and every engine component that needs to issue
//! commands concurrently.

use std::sync::Arc;
use std::time::Duration;

use jdwp::client::{ClientError, JdwpClient};
use jdwp::commands::event::Composite;
use jdwp::commands::Command;

#[derive(Clone)]
pub struct Session(Arc<JdwpClient>);

impl From<JdwpClient> for Session {
    fn from(client: JdwpClient) -> Self {
        Session(Arc::new(client))
    }
}

impl Session {
    pub fn send<C: Command>(&self, command: C) -> Result<C::Output, ClientError> {
        self.0.send(command)
    }

    pub fn client(&self) -> &JdwpClient {
        &self.0
    }

    pub fn receive_events(&self) -> Vec<Composite> {
        self.0.receive_events()
    }

    pub fn recv_event(&self) -> Option<Composite> {
        self.0.recv_event()
    }

    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<Composite> {
        self.0.recv_event_timeout(timeout)
    }
}
