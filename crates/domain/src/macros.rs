/// UUID v7 ベースの ID 型を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`Uuid` をラップ）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: UUID v7 を生成
/// - `from_uuid()` / `as_uuid()`
/// - `FromStr`: 空文字・不正な形式は `DomainError::Validation`
/// - `Default` impl（`new()` に委譲）
///
/// # 使用例
///
/// ```rust
/// use nutriagenda_domain::appointment::AppointmentId;
///
/// let id = AppointmentId::new();
/// let restored: AppointmentId = id.to_string().parse().unwrap();
/// assert_eq!(id, restored);
/// assert!("".parse::<AppointmentId>().is_err());
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident { label: $label:expr $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 新しい ID を生成する（UUID v7）
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            /// 既存の UUID から ID を作成する
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// 内部の UUID 参照を取得する
            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::str::FromStr for $Name {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = $crate::validation::require_non_empty(s, $label)?;
                uuid::Uuid::parse_str(value)
                    .map(Self)
                    .map_err(|_| $crate::DomainError::Validation(format!("{} inválido.", $label)))
            }
        }
    };
}

/// バリデーション付き String Newtype を定義する宣言型マクロ
///
/// 以下のボイラープレートを一括生成する:
/// - Newtype 構造体（`String` をラップ）
/// - `new()`: trim + 空チェック + 最大長チェック
/// - `as_str()` / `into_string()`
/// - `Display`
///
/// # 引数
///
/// - `$label`: エラーメッセージに使うラベル（例: `"ID do paciente"`）
/// - `$max_length`: 最大文字数（`chars().count()` でカウント）
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            label: $label:expr,
            max_length: $max_length:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        $vis struct $Name(String);

        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::DomainError> {
                let value = value.into();
                let value = $crate::validation::require_non_empty(&value, $label)?;

                if value.chars().count() > $max_length {
                    return Err($crate::DomainError::Validation(format!(
                        "{} deve ter no máximo {} caracteres.",
                        $label, $max_length
                    )));
                }

                Ok(Self(value.to_string()))
            }

            /// 文字列参照を取得する
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// 所有権を持つ文字列に変換する
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
