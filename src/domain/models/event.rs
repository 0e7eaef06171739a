/// Notifications published to whoever drives the client (the CLI today).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A request was rejected with 401 and the local session was torn down.
    /// The user has to go back through the login entry point.
    LoginRequired,
}
