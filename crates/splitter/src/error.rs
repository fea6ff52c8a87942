#[derive(thiserror::Error, Debug, serde::Deserialize, serde::Serialize)]
pub enum Error {
    #[error("No input PDFs were given")]
    NoInputs,

    #[error("Could not read {path}: {reason}")]
    Input { path: String, reason: String },

    #[error("Could not write run output to {path}: {reason}")]
    Output { path: String, reason: String },
}
