use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The runtime's create call returned the null handle.
    #[error("Runtime did not provide a native application handle")]
    CreateFailed,

    /// A native application instance already exists for this shell.
    #[error("Native application was already created")]
    AlreadyCreated,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
