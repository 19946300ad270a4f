//!
//! Lazy, forward-only cursors.
//!
//! A `Cursor` streams rows straight from `sqlite3_step`: each advance is one
//! step and only the row the statement is positioned on is ever decoded.
//! Memory stays bounded whatever the size of the result set.
//!
//! The cursor is single-pass. Once a step reports no more rows it stays at
//! the end and never steps again; a second pass needs a fresh
//! `Statement::execute_cursor`, which rebinds from the start.
//!
//! A cursor obtained from `Statement::execute_cursor` borrows the statement,
//! so the borrow checker keeps it from outliving the statement or from
//! overlapping a rebind. `Statement::into_cursor` (and the one-shot
//! `Database::execute_cursor`) move the compiled statement into the cursor
//! instead; it is finalized when the cursor is dropped.
//!

use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::errors::{ContractViolation, Result};
use crate::raw::RawStatement;
use crate::row::Row;
use crate::typed_row::FromRow;

enum Handle<'s> {
    Borrowed(&'s RawStatement),
    Owned(RawStatement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Unstarted,
    OnRow,
    End,
}

pub struct Cursor<'s, R> {
    handle: Handle<'s>,
    position: Position,
    _row: PhantomData<fn() -> R>,
}

impl<'s, R: FromRow> Cursor<'s, R> {
    pub(crate) fn borrowed(raw: &'s RawStatement) -> Self {
        Self::with_handle(Handle::Borrowed(raw))
    }

    pub(crate) fn owned(raw: RawStatement) -> Self {
        Self::with_handle(Handle::Owned(raw))
    }

    fn with_handle(handle: Handle<'s>) -> Self {
        Self {
            handle,
            position: Position::Unstarted,
            _row: PhantomData,
        }
    }

    fn raw(&self) -> &RawStatement {
        match &self.handle {
            Handle::Borrowed(raw) => *raw,
            Handle::Owned(raw) => raw,
        }
    }

    /// Performs the first step. `Ok(true)` means a first row exists.
    pub fn begin(&mut self) -> Result<bool> {
        if self.position != Position::Unstarted {
            return Err(ContractViolation::CursorRestarted.into());
        }
        self.step()
    }

    /// Performs one step, starting the cursor if it has not been started.
    pub fn advance(&mut self) -> Result<bool> {
        match self.position {
            Position::End => Err(ContractViolation::StepAfterExhaustion.into()),
            Position::Unstarted | Position::OnRow => self.step(),
        }
    }

    pub fn is_started(&self) -> bool {
        self.position != Position::Unstarted
    }

    /// True once a step has reported no more rows (or failed).
    pub fn is_at_end(&self) -> bool {
        self.position == Position::End
    }

    /// Decodes the row the cursor is positioned on.
    pub fn current(&self) -> Result<R> {
        match self.position {
            Position::OnRow => R::from_row(&Row::new(self.raw())),
            Position::Unstarted => Err(ContractViolation::CursorNotStarted.into()),
            Position::End => Err(ContractViolation::CursorExhausted.into()),
        }
    }

    fn step(&mut self) -> Result<bool> {
        match self.raw().step() {
            Ok(true) => {
                self.position = Position::OnRow;
                Ok(true)
            }
            Ok(false) => {
                self.position = Position::End;
                Ok(false)
            }
            Err(err) => {
                self.position = Position::End;
                Err(err)
            }
        }
    }
}

impl<R: FromRow> Iterator for Cursor<'_, R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_at_end() {
            return None;
        }
        match self.advance() {
            Ok(true) => Some(self.current()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

impl<R: FromRow> FusedIterator for Cursor<'_, R> {}
