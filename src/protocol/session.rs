use crate::codec::MessagePort;
use crate::error::{Error, Result};
use crate::protocol::{Command, Message, SimState};

/// Controller side of a co-simulation run.
///
/// Wraps a [`MessagePort`] and speaks the simulator's command protocol:
/// every command except `CLOSE` is answered by exactly one record.
///
/// Dropping a session that was not [`finish`](Session::finish)ed or
/// [`close`](Session::close)d sends a best-effort `$CLOSE` so the simulator
/// is not left waiting.
///
/// ## Example
///
/// ```rust,no_run
/// use cosimlink::codec::{FramedChannel, Framing};
/// use cosimlink::protocol::Session;
/// use cosimlink::{Channel, Config, Endpoint};
///
/// let mut channel = Channel::new(Config::server(Endpoint::tcp("127.0.0.1:60000")));
/// channel.open()?;
/// let mut session = Session::new(FramedChannel::new(channel, Framing::lines()));
///
/// session.set_delay(10)?;
/// session.resume()?;
/// let outputs = session.export()?;
/// println!("outputs: {outputs:?}");
/// session.finish()?;
/// # Ok::<(), cosimlink::Error>(())
/// ```
pub struct Session<P: MessagePort> {
    port: P,
    log_communication: bool,
    closed: bool,
}

impl<P: MessagePort> Session<P> {
    /// Start a session over an open port.
    pub fn new(port: P) -> Self {
        Self {
            port,
            log_communication: true,
            closed: false,
        }
    }

    /// Enable or disable `debug`-level logging of every record.
    #[must_use]
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_communication = enabled;
        self
    }

    /// Get mutable access to the port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Check if `$CLOSE` has been sent.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Send a command and wait for its reply.
    ///
    /// Returns `Ok(None)` for `$CLOSE`, which is not answered.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] once the session has been closed
    /// - [`Error::Transport`] with `Disconnected` if the simulator hangs up
    ///   before replying
    /// - [`Error::Protocol`] if the reply is not a record
    pub fn command(&mut self, command: &Command) -> Result<Option<Message>> {
        if self.closed {
            return Err(Error::NotConnected);
        }

        let text = command.to_message().encode()?;
        self.port.send_message(text.as_bytes())?;
        if self.log_communication {
            tracing::debug!(command = %text, "sent");
        }

        if !command.expects_reply() {
            self.closed = true;
            return Ok(None);
        }

        let Some(bytes) = self.port.recv_message()? else {
            return Err(Error::disconnected(format!(
                "simulator closed the connection before answering {}",
                command.kind()
            )));
        };
        let reply = Message::from_bytes(&bytes)?;
        if self.log_communication {
            tracing::debug!(reply = %reply, "received");
        }
        Ok(Some(reply))
    }

    fn acknowledged(&mut self, command: &Command) -> Result<Message> {
        match self.command(command)? {
            Some(reply) if reply.is_resp() => Ok(reply),
            Some(reply) => Err(Error::Protocol(format!(
                "expected RESP to {}, got {}",
                command.kind(),
                reply.kind
            ))),
            None => Err(Error::Protocol(format!("{} has no reply", command.kind()))),
        }
    }

    fn answered(&mut self, command: &Command) -> Result<Message> {
        self.command(command)?
            .ok_or_else(|| Error::Protocol(format!("{} has no reply", command.kind())))
    }

    /// Ask the simulator where it is parked.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the reply is not `$RESP,<index>` with a
    /// known index, plus any transport error.
    pub fn sim_state(&mut self) -> Result<SimState> {
        let reply = self.acknowledged(&Command::get_state())?;
        let index = reply
            .params
            .first()
            .ok_or_else(|| Error::Protocol("state reply has no value".into()))?;
        SimState::parse_index(index)
    }

    /// Let the simulator run to its next stop. Returns its reply.
    ///
    /// # Errors
    ///
    /// Any transport or protocol error.
    pub fn resume(&mut self) -> Result<Message> {
        self.answered(&Command::Continue)
    }

    /// Set the delay the simulator waits before its next time step.
    ///
    /// # Errors
    ///
    /// Any transport or protocol error.
    pub fn set_delay(&mut self, delay: u64) -> Result<()> {
        self.answered(&Command::set_delay(delay)).map(|_| ())
    }

    /// Drive the simulator inputs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] unless the simulator acknowledges with
    /// `$RESP`, and [`Error::InvalidArgument`] if a value contains `,`.
    pub fn import<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()> {
        let values = values.iter().map(|v| v.as_ref().to_owned()).collect();
        self.acknowledged(&Command::Import(values)).map(|_| ())
    }

    /// Collect the simulator outputs, in port order.
    ///
    /// # Errors
    ///
    /// Any transport or protocol error.
    pub fn export(&mut self) -> Result<Vec<String>> {
        self.answered(&Command::Export).map(|reply| reply.params)
    }

    /// Run the simulator to its delay stop, then close the session.
    ///
    /// # Errors
    ///
    /// Any transport or protocol error; the session is not closed if one
    /// occurs before `$CLOSE` is sent.
    pub fn finish(&mut self) -> Result<()> {
        loop {
            let state = self.sim_state()?;
            if state == SimState::Delay {
                break;
            }
            tracing::trace!(%state, "draining simulator before close");
            self.resume()?;
        }
        self.close()
    }

    /// Send `$CLOSE` without draining. Calling it again does nothing.
    ///
    /// # Errors
    ///
    /// Any transport error while sending.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.command(&Command::Close).map(|_| ())
    }
}

impl<P: MessagePort> Drop for Session<P> {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}
