// src/models/rbac.rs

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Área funcional do back-office, liberada por cargo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Reservas,
    Menus,
    Ajustes,
    Miembros,
    Fichaje,
    Horarios,
    Facturas,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Reservas,
        Section::Menus,
        Section::Ajustes,
        Section::Miembros,
        Section::Fichaje,
        Section::Horarios,
        Section::Facturas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Reservas => "reservas",
            Section::Menus => "menus",
            Section::Ajustes => "ajustes",
            Section::Miembros => "miembros",
            Section::Fichaje => "fichaje",
            Section::Horarios => "horarios",
            Section::Facturas => "facturas",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .iter()
            .copied()
            .find(|section| section.as_str() == s.trim())
            .ok_or_else(|| format!("Sección desconocida: {s}"))
    }
}

// O que sai do banco (tabela bo_roles)
#[derive(Debug, Clone, FromRow)]
pub struct PersistedRole {
    pub restaurant_id: i32,
    pub slug: String,
    pub label: String,
    pub importance: i32,
    pub created_at: DateTime<Utc>,
}

/// Cargo já resolvido (persistido ou do sistema), como o front enxerga.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoleView {
    #[schema(example = "responsable_sala")]
    pub slug: String,
    #[schema(example = "Responsable de sala")]
    pub label: String,
    #[schema(example = 60)]
    pub importance: i32,
    pub sections: Vec<Section>,
    pub is_system: bool,
}

/// Slug de cargo: `[a-z0-9_]`, de 2 a 32 caracteres.
pub fn validate_role_slug(slug: &str) -> Result<(), ValidationError> {
    let ok = (2..=32).contains(&slug.len())
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if ok {
        Ok(())
    } else {
        let mut err = ValidationError::new("role_slug");
        err.message = Some(
            "El identificador del rol debe tener entre 2 y 32 caracteres [a-z0-9_]".into(),
        );
        Err(err)
    }
}

// O Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRolePayload {
    #[validate(custom(function = "validate_role_slug"))]
    #[schema(example = "encargado_terraza")]
    pub slug: String,

    #[validate(length(min = 1, max = 64, message = "El nombre del rol es obligatorio"))]
    #[schema(example = "Encargado de terraza")]
    pub label: String,

    #[validate(range(min = 0, max = 100, message = "La importancia debe estar entre 0 y 100"))]
    #[schema(example = 35)]
    pub importance: i32,

    #[serde(default)]
    pub sections: Vec<Section>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRolePayload {
    #[schema(example = "camarero")]
    pub role: String,
}

/// Permissões efetivas do usuário na sessão atual.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EffectivePermissions {
    pub role: String,
    pub importance: i32,
    pub sections: Vec<Section>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_round_trips_through_text() {
        for section in Section::ALL {
            assert_eq!(section.as_str().parse::<Section>().unwrap(), section);
        }
        assert!("cocina".parse::<Section>().is_err());
    }

    #[test]
    fn role_slug_rules() {
        assert!(validate_role_slug("jefe_sala2").is_ok());
        assert!(validate_role_slug("a").is_err());
        assert!(validate_role_slug("Jefe").is_err());
        assert!(validate_role_slug("jefe-sala").is_err());
        assert!(validate_role_slug(&"x".repeat(33)).is_err());
    }

    #[test]
    fn create_role_payload_validation() {
        let payload = CreateRolePayload {
            slug: "terraza".into(),
            label: "Terraza".into(),
            importance: 101,
            sections: vec![Section::Reservas],
        };
        assert!(payload.validate().is_err());
    }
}
