/// The supported output formats for a decoded hypothesis.
///
/// Why this exists:
/// - We want a single, strongly-typed representation of output formats
///   across the CLI and library code.
/// - Using an enum avoids stringly-typed conditionals and keeps format
///   selection explicit and discoverable.
///
/// Integration notes:
/// - When the `cli` feature is enabled, we derive `clap::ValueEnum` so the enum can be used
///   directly as a CLI flag.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputType {
    /// Output the hypothesis as a JSON object (word ids and path weight).
    Json,

    /// Output the hypothesis as one line of text, words in spoken order.
    Text,
}
