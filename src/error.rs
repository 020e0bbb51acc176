use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not read interactive input")]
    Prompt,
    /// A required setting came from no source and couldn't be prompted for.
    #[display("no {_0} configured: pass --{_0}, set BUCKETEER_{} or run interactively", _0.to_ascii_uppercase())]
    MissingSetting(#[error(not(source))] &'static str),
    #[display("upload aborted")]
    Upload,
    #[display("could not write output")]
    Output,
}
