/// Byte offset span in signature text.
pub type Span = std::ops::Range<usize>;

/// A value with an associated source span.
pub type Spanned<T> = (T, Span);
