/// The supported output formats for an encoded [`crate::AnswerResult`].
///
/// Why this exists:
/// - The CLI and library callers pick a format in one typed place instead of matching on
///   strings.
/// - The engine never formats output itself; the chosen encoder does.
///
/// Integration notes:
/// - With the `cli` feature, `ValueEnum` lets this enum be used directly as a CLI flag.
/// - Each variant maps to a concrete `AnswerEncoder` implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputType {
    /// The answer text, followed by its evidence status.
    Text,

    /// The full result as a JSON object.
    Json,
}
