pub const KEYWORDS_CORE: &[&str] = &[
    "abstype", "and", "andalso", "as", "case", "datatype", "do", "else", "end", "exception",
    "fn", "fun", "handle", "if", "in", "infix", "infixr", "let", "local", "nonfix", "of", "op",
    "open", "orelse", "raise", "rec", "then", "type", "val", "while", "with", "withtype",
];

pub const KEYWORDS_MODULE: &[&str] = &[
    "eqtype", "functor", "include", "sharing", "sig", "signature", "struct", "structure",
    "where",
];

pub const KEYWORDS_ALL: &[&str] = &[
    "abstype", "and", "andalso", "as", "case", "datatype", "do", "else", "end", "eqtype",
    "exception", "fn", "fun", "functor", "handle", "if", "in", "include", "infix", "infixr",
    "let", "local", "nonfix", "of", "op", "open", "orelse", "raise", "rec", "sharing", "sig",
    "signature", "struct", "structure", "then", "type", "val", "where", "while", "with",
    "withtype",
];

pub const KEYWORDS_MLB: &[&str] = &[
    "ann", "and", "bas", "basis", "end", "functor", "in", "let", "local", "open", "signature",
    "structure",
];

/// Symbolic sequences that are reserved rather than symbolic identifiers.
/// `::` and `:=` are NOT here: they lex as ordinary symbolic identifiers.
pub const RESERVED_SYMBOLIC: &[&str] = &[":", "|", "=", "=>", "->", "#", ":>"];

/// Single-character punctuation that always forms its own token.
pub const PUNCTUATION: &[char] = &['(', ')', '[', ']', '{', '}', ',', ';'];

pub const SYMBOLIC_CHARS: &[char] = &[
    '!', '%', '&', '$', '#', '+', '-', '/', ':', '<', '=', '>', '?', '@', '\\', '~', '`', '^',
    '|', '*',
];

pub fn is_symbolic_char(ch: char) -> bool {
    SYMBOLIC_CHARS.contains(&ch)
}

pub fn is_reserved_word(text: &str) -> bool {
    KEYWORDS_ALL.contains(&text)
}

/// The Basis fixities every parse starts from.
/// (name, precedence, right-associative)
pub const INITIAL_FIXITIES: &[(&str, u8, bool)] = &[
    ("div", 7, false),
    ("mod", 7, false),
    ("*", 7, false),
    ("/", 7, false),
    ("+", 6, false),
    ("-", 6, false),
    ("^", 6, false),
    ("::", 5, true),
    ("@", 5, true),
    ("=", 4, false),
    ("<>", 4, false),
    ("<", 4, false),
    (">", 4, false),
    ("<=", 4, false),
    (">=", 4, false),
    (":=", 3, false),
    ("o", 3, false),
    ("before", 0, false),
];
