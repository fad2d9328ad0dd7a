//! Macros for reducing boilerplate when defining documents
//!
//! Every entity stores its identifier in `id: Option<Uuid>` and its creation
//! time in `created_at: Option<DateTime<Utc>>`; the macros below generate the
//! repetitive trait implementations on top of those two fields.

/// Implement [`Document`](crate::core::Document) for a struct
///
/// The struct must have the fields `id: Option<Uuid>` and
/// `created_at: Option<DateTime<Utc>>`.
///
/// # Example
/// ```rust,ignore
/// #[derive(Clone, Debug, Serialize, Deserialize)]
/// pub struct Item {
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     pub id: Option<Uuid>,
///     #[serde(rename = "timestamp", default, skip_serializing_if = "Option::is_none")]
///     pub created_at: Option<DateTime<Utc>>,
///     pub name: String,
/// }
///
/// impl_document!(Item, "products", "item");
/// ```
#[macro_export]
macro_rules! impl_document {
    ($type:ident, $collection:expr, $singular:expr) => {
        impl $crate::core::entity::Document for $type {
            fn collection() -> &'static str {
                $collection
            }

            fn singular() -> &'static str {
                $singular
            }

            fn id(&self) -> Option<::uuid::Uuid> {
                self.id
            }

            fn set_id(&mut self, id: ::uuid::Uuid) {
                self.id = Some(id);
            }

            fn created_at(&self) -> Option<::chrono::DateTime<::chrono::Utc>> {
                self.created_at
            }

            fn stamp(&mut self, at: ::chrono::DateTime<::chrono::Utc>) {
                self.created_at = Some(at);
            }
        }
    };
}

/// Implement a string-backed status enum with a catch-all variant
///
/// Known values map to unit variants; anything else is preserved verbatim in
/// the `Other(String)` variant so documents written by older clients still
/// load.
///
/// # Example
/// ```rust,ignore
/// string_status!(InvoiceStatus, default = Unpaid, {
///     Unpaid => "unpaid",
///     Paid => "paid",
/// });
/// ```
#[macro_export]
macro_rules! string_status {
    ($type:ident, default = $default:ident, { $($variant:ident => $value:literal),+ $(,)? }) => {
        #[derive(Clone, Debug, PartialEq, Eq, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $type {
            $($variant,)+
            Other(String),
        }

        impl $type {
            pub fn as_str(&self) -> &str {
                match self {
                    $($type::$variant => $value,)+
                    $type::Other(value) => value.as_str(),
                }
            }
        }

        impl Default for $type {
            fn default() -> Self {
                $type::$default
            }
        }

        impl From<String> for $type {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($value => $type::$variant,)+
                    _ => $type::Other(value),
                }
            }
        }

        impl From<&str> for $type {
            fn from(value: &str) -> Self {
                $type::from(value.to_string())
            }
        }

        impl From<$type> for String {
            fn from(status: $type) -> Self {
                status.as_str().to_string()
            }
        }

        impl ::std::fmt::Display for $type {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
