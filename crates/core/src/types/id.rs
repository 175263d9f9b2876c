//! Newtype row IDs.
//!
//! Every persisted collection gets its own `i32` wrapper so an `OrderId`
//! can never be passed where a `ProductId` belongs. The wrappers are plain
//! data: `Copy`, transparent serde, and (behind the `postgres` feature)
//! encode/decode as `INTEGER`.

/// Define one or more `i32` ID newtypes.
///
/// ```rust
/// # use copperleaf_core::define_id;
/// define_id!(InvoiceId, ShipmentId);
///
/// let invoice = InvoiceId::new(1);
/// assert_eq!(invoice.as_i32(), 1);
/// // A ShipmentId is a different type; assigning one to the other
/// // does not compile.
/// ```
#[macro_export]
macro_rules! define_id {
    ($($name:ident),+ $(,)?) => {$(
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    )+};
}

define_id!(
    UserId,
    ProductId,
    VariantId,
    CategoryId,
    OrderId,
    OrderItemId,
    CancelledOrderId,
    CartItemId,
    WishlistItemId,
    NotificationId,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_i32() {
        let id = OrderId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(OrderId::from(42), id);
        assert_eq!(i32::from(id), 42);
    }

    #[test]
    fn id_serializes_transparently() {
        let id = ProductId::new(7);
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "7");
        let back: ProductId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn display_matches_the_raw_value() {
        assert_eq!(UserId::new(3).to_string(), "3");
    }
}
