use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn channel_closed(channel: impl Into<String>) -> Error {
        Error(
            ErrorKind::ChannelClosed {
                channel: channel.into(),
            }
            .into(),
        )
    }

    pub fn job_failed(job_id: u64, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::JobFailed {
                job_id,
                message: message.into(),
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("send on closed channel '{channel}'")]
    ChannelClosed { channel: String },

    #[error("job {job_id} failed: {message}")]
    JobFailed { job_id: u64, message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
