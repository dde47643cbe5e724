#[macro_export]
macro_rules! id {
    ($name: ident) => {
        ::paste::paste! {
            #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, ::sqlx::Type, ::serde::Serialize, ::serde::Deserialize)]
            #[sqlx(transparent)]
            #[serde(transparent)]
            pub struct [<$name Id>](pub ::uuid::Uuid);

            impl [<$name Id>] {
                pub fn generate() -> Self {
                    Self(::uuid::Uuid::new_v4())
                }
            }

            impl ::std::fmt::Display for [<$name Id>] {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    ::std::fmt::Display::fmt(&self.0, f)
                }
            }

            impl ::std::str::FromStr for [<$name Id>] {
                type Err = ::uuid::Error;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Ok(Self(s.parse()?))
                }
            }
        }
   };
}
