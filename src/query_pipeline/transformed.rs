/// Outcome of rewriting one node
#[derive(Debug, PartialEq, Clone)]
pub enum Transformed<T> {
    Yes(T),
    No(T),
}

impl<T> Transformed<T> {
    pub fn into_inner(self) -> T {
        match self {
            Transformed::Yes(expr) | Transformed::No(expr) => expr,
        }
    }

    pub fn is_yes(&self) -> bool {
        matches!(self, Transformed::Yes(_))
    }

    /// Apply `f` to the payload, keeping the outcome
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Transformed<U> {
        match self {
            Transformed::Yes(expr) => Transformed::Yes(f(expr)),
            Transformed::No(expr) => Transformed::No(f(expr)),
        }
    }
}
