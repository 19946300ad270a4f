//!
//! Typed rows and parameter lists.
//!
//! `FromRow` composes column reads into one result row: a bare scalar for a
//! single-column query, a tuple `(A, B, ...)` for several columns, or
//! `Vec<Value>` when the shape is only known at runtime. `Params` composes
//! parameter writes: `()` for none, a bare scalar for one, a tuple for
//! several, or a slice/`Vec` of `Value`s. Tuple element `i` maps to column
//! `i` and to placeholder `i + 1`.
//!

use crate::codec::{FromColumn, ToParam};
use crate::errors::Result;
use crate::kind::Kind;
use crate::row::{Binder, Row};
use crate::value::Value;

/// One decoded result row.
pub trait FromRow: Sized {
    /// Number of columns read, or `None` when the row takes whatever the query yields.
    const ARITY: Option<usize>;

    /// Kinds of the columns read, in order.
    fn kinds() -> Vec<Kind>;

    fn from_row(row: &Row<'_>) -> Result<Self>;
}

/// An ordered list of arguments for a statement's placeholders.
pub trait Params {
    fn param_count(&self) -> usize;

    /// Writes every argument, the first one to placeholder 1.
    fn bind_params(&self, binder: &Binder<'_>) -> Result<()>;
}

macro_rules! scalar_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                const ARITY: Option<usize> = Some(1);

                fn kinds() -> Vec<Kind> {
                    vec![<$ty as FromColumn>::KIND]
                }

                fn from_row(row: &Row<'_>) -> Result<Self> {
                    <$ty as FromColumn>::from_column(row, 0)
                }
            }
        )*
    };
}

scalar_row!(i64, i32, f64, String, Vec<u8>, Value);

impl<T: FromColumn> FromRow for Option<T> {
    const ARITY: Option<usize> = Some(1);

    fn kinds() -> Vec<Kind> {
        vec![T::KIND]
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        <Option<T> as FromColumn>::from_column(row, 0)
    }
}

impl FromRow for Vec<Value> {
    const ARITY: Option<usize> = None;

    fn kinds() -> Vec<Kind> {
        Vec::new()
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        (0..row.column_count())
            .map(|index| Value::read(row, index))
            .collect()
    }
}

macro_rules! count {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count!($($tail)*) };
}

macro_rules! tuple_row {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: FromColumn),+> FromRow for ($($name,)+) {
            const ARITY: Option<usize> = Some(count!($($name)+));

            fn kinds() -> Vec<Kind> {
                vec![$($name::KIND),+]
            }

            fn from_row(row: &Row<'_>) -> Result<Self> {
                Ok(($($name::from_column(row, $idx)?,)+))
            }
        }

        impl<$($name: ToParam),+> Params for ($($name,)+) {
            fn param_count(&self) -> usize {
                count!($($name)+)
            }

            fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
                $(self.$idx.bind_param(binder, $idx + 1)?;)+
                Ok(())
            }
        }
    };
}

tuple_row!(A: 0, B: 1);
tuple_row!(A: 0, B: 1, C: 2);
tuple_row!(A: 0, B: 1, C: 2, D: 3);
tuple_row!(A: 0, B: 1, C: 2, D: 3, E: 4);
tuple_row!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
tuple_row!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
tuple_row!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

impl<A: ToParam> Params for (A,) {
    fn param_count(&self) -> usize {
        1
    }

    fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
        self.0.bind_param(binder, 1)
    }
}

impl Params for () {
    fn param_count(&self) -> usize {
        0
    }

    fn bind_params(&self, _binder: &Binder<'_>) -> Result<()> {
        Ok(())
    }
}

macro_rules! scalar_params {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Params for $ty {
                fn param_count(&self) -> usize {
                    1
                }

                fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
                    self.bind_param(binder, 1)
                }
            }
        )*
    };
}

scalar_params!(i64, i32, f64, str, String, [u8], Vec<u8>, Value);

impl<T: ToParam> Params for Option<T> {
    fn param_count(&self) -> usize {
        1
    }

    fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
        self.bind_param(binder, 1)
    }
}

impl Params for [Value] {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
        for (position, value) in self.iter().enumerate() {
            value.bind_param(binder, position + 1)?;
        }
        Ok(())
    }
}

impl Params for Vec<Value> {
    fn param_count(&self) -> usize {
        self.len()
    }

    fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
        self.as_slice().bind_params(binder)
    }
}

impl<const N: usize> Params for [Value; N] {
    fn param_count(&self) -> usize {
        N
    }

    fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
        self.as_slice().bind_params(binder)
    }
}

impl<P: Params + ?Sized> Params for &P {
    fn param_count(&self) -> usize {
        (**self).param_count()
    }

    fn bind_params(&self, binder: &Binder<'_>) -> Result<()> {
        (**self).bind_params(binder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_arity() {
        assert_eq!(<i64 as FromRow>::ARITY, Some(1));
        assert_eq!(<Option<String> as FromRow>::ARITY, Some(1));
        assert_eq!(<(i64, String) as FromRow>::ARITY, Some(2));
        assert_eq!(<(i64, f64, String, Vec<u8>) as FromRow>::ARITY, Some(4));
        assert_eq!(<Vec<Value> as FromRow>::ARITY, None);
    }

    #[test]
    fn test_row_kinds_follow_declared_order() {
        assert_eq!(
            <(i64, String, Vec<u8>, f64) as FromRow>::kinds(),
            vec![Kind::Integer, Kind::Text, Kind::Blob, Kind::Float]
        );
        assert_eq!(<Vec<u8> as FromRow>::kinds(), vec![Kind::Blob]);
        assert!(<Vec<Value> as FromRow>::kinds().is_empty());
    }

    #[test]
    fn test_param_counts() {
        assert_eq!(().param_count(), 0);
        assert_eq!(10_i64.param_count(), 1);
        assert_eq!("john".param_count(), 1);
        assert_eq!(("john", 10).param_count(), 2);
        assert_eq!((1, 2.0, "three", vec![4_u8]).param_count(), 4);
        assert_eq!(vec![Value::Null, Value::Integer(1)].param_count(), 2);
        assert_eq!([Value::Null, Value::Null, Value::Null].param_count(), 3);
        assert_eq!(Some(1).param_count(), 1);
    }
}
