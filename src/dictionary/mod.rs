pub mod term_dictionary;

pub use term_dictionary::{DictEntry, TermDictionary};
