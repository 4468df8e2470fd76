/// How malformed lines in annotation and ledger files are handled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ParseMode {
    /// Log the offending line and keep going.
    #[default]
    Lenient,
    /// Fail on the first offending line.
    Strict,
}
