//! Newtype IDs for type-safe document references.
//!
//! Documents in the store are keyed by opaque strings: catalog entries use
//! human-chosen slugs (`city-lights`), carts and orders use generated UUIDs,
//! and payment references come from the gateway (`pi_...`, `evt_...`).
//! Use the `define_id!` macro to create wrappers that prevent accidentally
//! mixing keys from different collections.

/// Generate a fresh random identifier (UUID v4, hyphenated).
#[must_use]
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `generate()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, `AsRef<str>` and `Display`
///
/// # Example
///
/// ```rust
/// # use darkroom_core::define_id;
/// define_id!(CartId);
/// define_id!(OrderId);
///
/// let cart_id = CartId::new("c-1");
/// let order_id = OrderId::generate();
///
/// // These are different types, so this won't compile:
/// // let _: CartId = order_id;
/// # let _ = (cart_id, order_id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self($crate::types::id::generate_id())
            }

            /// Get the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Catalog
define_id!(ProductId);
define_id!(VariantId);

// Customer-facing documents
define_id!(UserId);
define_id!(CartId);
define_id!(OrderId);

// Payment gateway references
define_id!(PaymentIntentId);
define_id!(WebhookEventId);
