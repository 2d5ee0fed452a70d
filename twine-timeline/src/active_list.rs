/// Position of the active element in an ordered collection.
///
/// `None` plays the role of the null index: it is the state of every empty
/// collection and only of empty collections. Cursors are only moved by the
/// collection owning them, so the active index always stays in bounds:
///
/// ```compile_fail
/// use twine_timeline::Cursor;
///
/// let mut cursor = Cursor::default();
/// cursor.next(3);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    index: Option<usize>,
}

impl Cursor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn is_null(&self) -> bool {
        self.index.is_none()
    }

    /// Moves to `index` when it is valid for a collection of `len` elements.
    pub(crate) fn select(&mut self, index: usize, len: usize) -> bool {
        if index < len {
            self.index = Some(index);
            true
        } else {
            false
        }
    }

    pub(crate) fn previous(&mut self, len: usize) {
        if let Some(index) = self.index {
            if index > 0 {
                self.select(index - 1, len);
            }
        }
    }

    pub(crate) fn next(&mut self, len: usize) {
        if let Some(index) = self.index {
            self.select(index + 1, len);
        }
    }

    pub(crate) fn first(&mut self, len: usize) {
        self.index = if len > 0 { Some(0) } else { None };
    }

    pub(crate) fn last(&mut self, len: usize) {
        self.index = len.checked_sub(1);
    }

    /// Called after the element at `removed` left a collection that now holds
    /// `len` elements. The cursor keeps pointing at the same element when it
    /// survived; when the active element itself was removed the element that
    /// took its place becomes active, or the new last one.
    pub(crate) fn removed(&mut self, removed: usize, len: usize) {
        self.index = match self.index {
            _ if len == 0 => None,
            Some(index) if index > removed => Some(index - 1),
            Some(index) if index >= len => Some(len - 1),
            other => other,
        };
    }

    /// Called after an element was inserted at `inserted`.
    pub(crate) fn inserted(&mut self, inserted: usize) {
        self.index = match self.index {
            None => Some(0),
            Some(index) if index >= inserted => Some(index + 1),
            other => other,
        };
    }

    /// Points the cursor at `index` regardless of bounds; callers own the check.
    pub(crate) fn set(&mut self, index: Option<usize>) {
        self.index = index;
    }
}

pub(crate) mod sealed {
    use super::Cursor;

    /// Can only be built inside this crate.
    pub struct Token(());

    impl Token {
        pub(crate) fn new() -> Self {
            Token(())
        }
    }

    /// Mutable access to the cursor, reserved to the owning collection.
    pub trait CursorOwner {
        fn cursor_mut(&mut self, token: Token) -> &mut Cursor;
    }
}

/// Navigation contract shared by every collection with an active element.
///
/// Implementors supply the length and access to their [`Cursor`]; every
/// movement is a no-op when it would leave the collection, and on an empty
/// collection the active index stays `None`. The trait is sealed.
pub trait ActiveList: sealed::CursorOwner {
    fn len(&self) -> usize;

    fn cursor(&self) -> &Cursor;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn active_index(&self) -> Option<usize> {
        self.cursor().index()
    }

    fn is_valid_index(&self, index: usize) -> bool {
        index < self.len()
    }

    fn activate_previous(&mut self) {
        let len = self.len();
        self.cursor_mut(sealed::Token::new()).previous(len);
    }

    fn activate_next(&mut self) {
        let len = self.len();
        self.cursor_mut(sealed::Token::new()).next(len);
    }

    fn activate_first(&mut self) {
        let len = self.len();
        self.cursor_mut(sealed::Token::new()).first(len);
    }

    fn activate_last(&mut self) {
        let len = self.len();
        self.cursor_mut(sealed::Token::new()).last(len);
    }
}
