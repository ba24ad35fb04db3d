use indexmap::IndexMap;

use crate::{error::Error, grammer::ast::Type};

use super::registry::SLOT;

/// Frame sizes are rounded up to this many bytes.
pub const FRAME_ALIGN: usize = 64;

/// Largest frame a signed 32-bit displacement from `rbp` can reach.
pub const FRAME_LIMIT: usize = i32::MAX as usize - FRAME_ALIGN;

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub offset: usize,
    pub ty: Type,
}

/// Index of the `sub rsp, ?` placeholder of a function prologue.
///
/// Not `Clone`: applying it consumes the handle, so a prologue is patched at
/// most once.
#[derive(Debug)]
pub struct FramePatch {
    index: usize,
}

impl FramePatch {
    pub(super) fn new(index: usize) -> Self {
        Self { index }
    }

    pub(super) fn index(self) -> usize {
        self.index
    }
}

/// Per-function symbol table and stack cursor.
#[derive(Debug)]
pub struct Frame {
    symbols: IndexMap<String, Symbol>,
    cursor: usize,
    patch: Option<FramePatch>,
}

impl Frame {
    pub fn open(shadow: usize, patch: FramePatch) -> Self {
        Self {
            symbols: IndexMap::new(),
            cursor: shadow,
            patch: Some(patch),
        }
    }

    /// Reserve `size` bytes for `name`; the first slot is at `rbp - offset`,
    /// slot `i` at `rbp - (offset + 8i)`. Redeclaring a name gives it a new slot.
    pub fn alloc(&mut self, name: &str, ty: Type, size: usize) -> Result<usize, Error> {
        let offset = self.cursor + SLOT;
        self.cursor = self
            .cursor
            .checked_add(size)
            .filter(|cursor| *cursor <= FRAME_LIMIT)
            .ok_or_else(|| Error::FrameOverflow(format!("${}", name)))?;
        self.symbols.insert(name.to_string(), Symbol { offset, ty });
        Ok(offset)
    }

    pub fn lookup(&self, name: &str) -> Result<&Symbol, Error> {
        self.symbols
            .get(name)
            .ok_or_else(|| Error::UndeclaredVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bytes to reserve below `rbp` for everything allocated so far.
    pub fn size(&self) -> usize {
        self.cursor.div_ceil(FRAME_ALIGN) * FRAME_ALIGN
    }

    /// The pending prologue patch; `None` once it has been taken.
    pub fn take_patch(&mut self) -> Option<FramePatch> {
        self.patch.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_grow_without_overlap() {
        let mut frame = Frame::open(0, FramePatch::new(0));
        let a = frame.alloc("a", Type::Int, 8).unwrap();
        let s = frame.alloc("s", Type::Named("Pair".into()), 16).unwrap();
        let b = frame.alloc("b", Type::Int, 8).unwrap();
        assert_eq!((a, s, b), (8, 16, 32));
        assert_eq!(frame.cursor(), 32);
        assert_eq!(frame.lookup("s").unwrap().offset, 16);
    }

    #[test]
    fn shadow_space_moves_first_slot() {
        let mut frame = Frame::open(32, FramePatch::new(0));
        assert_eq!(frame.alloc("x", Type::Int, 8), Ok(40));
    }

    #[test]
    fn size_rounds_to_64() {
        let mut frame = Frame::open(0, FramePatch::new(0));
        assert_eq!(frame.size(), 0);
        frame.alloc("x", Type::Int, 8).unwrap();
        assert_eq!(frame.size(), 64);
        frame.alloc("arr", Type::Array(Box::new(Type::Int), 8), 64).unwrap();
        assert_eq!(frame.size(), 128);
    }

    #[test]
    fn oversized_alloc_rejected() {
        let mut frame = Frame::open(0, FramePatch::new(0));
        frame.alloc("x", Type::Int, 8).unwrap();
        assert_eq!(
            frame.alloc("big", Type::Int, usize::MAX),
            Err(Error::FrameOverflow("$big".into()))
        );
        assert_eq!(
            frame.alloc("big", Type::Int, FRAME_LIMIT),
            Err(Error::FrameOverflow("$big".into()))
        );
        // A rejected slot leaves the cursor alone
        assert_eq!(frame.cursor(), 8);
        assert!(!frame.contains("big"));
    }

    #[test]
    fn patch_taken_once() {
        let mut frame = Frame::open(0, FramePatch::new(3));
        assert_eq!(frame.take_patch().map(FramePatch::index), Some(3));
        assert!(frame.take_patch().is_none());
    }

    #[test]
    fn undeclared_lookup() {
        let frame = Frame::open(0, FramePatch::new(0));
        assert_eq!(
            frame.lookup("ghost"),
            Err(Error::UndeclaredVariable("ghost".into()))
        );
    }
}
