//! Host functions that `extern` declarations can bind to.

use std::collections::HashMap;

/// A host function callable from JIT code. Every parameter and the return
/// value are `i64`.
#[derive(Debug, Clone, Copy)]
pub struct HostSymbol {
    pub ptr: *const u8,
    pub arity: usize,
}

/// Symbols registered with the JIT, by name.
#[derive(Debug, Clone, Default)]
pub(crate) struct RuntimeSymbols {
    symbols: HashMap<String, HostSymbol>,
}

impl RuntimeSymbols {
    /// The built-in runtime.
    pub(crate) fn builtin() -> Self {
        let mut symbols = Self::default();
        symbols.insert("printi", xy_printi as *const u8, 1);
        symbols
    }

    pub(crate) fn insert(&mut self, name: &str, ptr: *const u8, arity: usize) {
        self.symbols.insert(name.to_string(), HostSymbol { ptr, arity });
    }

    pub(crate) fn get(&self, name: &str) -> Option<&HostSymbol> {
        self.symbols.get(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &HostSymbol)> {
        self.symbols.iter()
    }
}

/// `printi(v)`: prints `v` on its own line and returns 0.
pub extern "C" fn xy_printi(value: i64) -> i64 {
    println!("{}", value);
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_symbols() {
        let symbols = RuntimeSymbols::builtin();
        let printi = symbols.get("printi").unwrap();
        assert_eq!(printi.arity, 1);
        assert!(!printi.ptr.is_null());
        assert!(symbols.get("printf").is_none());
    }

    #[test]
    fn test_printi_returns_zero() {
        assert_eq!(xy_printi(7), 0);
    }
}
