// src/common/patch.rs

use serde::{Deserialize, Deserializer};

/// Campo de um PATCH com três estados: ausente (não mexer), `null`
/// (limpar) ou um valor novo.
///
/// Use sempre com `#[serde(default)]` no campo: a chave ausente cai no
/// `Default` (`Absent`) e só as chaves presentes passam pelo `Deserialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// `true` quando o cliente mandou a chave, mesmo que `null`.
    pub fn is_present(&self) -> bool {
        !self.is_absent()
    }

    /// Aplica o patch sobre um valor opcional existente.
    pub fn apply_to(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Absent => current,
            Patch::Null => None,
            Patch::Value(v) => Some(v),
        }
    }

    /// Para campos obrigatórios: `null` não limpa, mantém o atual.
    pub fn apply_required(self, current: T) -> T {
        match self {
            Patch::Value(v) => v,
            _ => current,
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        commentary: Patch<String>,
        #[serde(default)]
        table_number: Patch<String>,
        #[serde(default)]
        high_chairs: Patch<i32>,
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let body: Body =
            serde_json::from_str(r#"{"commentary": "ventana", "table_number": null}"#).unwrap();
        assert_eq!(body.commentary, Patch::Value("ventana".to_string()));
        assert_eq!(body.table_number, Patch::Null);
        assert_eq!(body.high_chairs, Patch::Absent);
    }

    #[test]
    fn apply_semantics() {
        assert_eq!(Patch::<i32>::Absent.apply_to(Some(2)), Some(2));
        assert_eq!(Patch::<i32>::Null.apply_to(Some(2)), None);
        assert_eq!(Patch::Value(5).apply_to(Some(2)), Some(5));
        assert_eq!(Patch::<i32>::Null.apply_required(4), 4);
    }
}
