// src/services/rbac_service.rs

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::common::error::AppError;
use crate::db::{MemberRepository, RbacRepository, TenantRepository};
use crate::models::auth::AuthContext;
use crate::models::rbac::{CreateRolePayload, EffectivePermissions, RoleView, Section};

/// Cargo do superadmin: ignora qualquer tabela.
pub const ROOT_ROLE: &str = "root";

/// Cargo assumido quando o vínculo usuário-restaurante não tem cargo.
pub const DEFAULT_LINKED_ROLE: &str = "admin";

pub const MAX_IMPORTANCE: i32 = 100;

// ---
// Tabela de cargos do sistema (dado estático, nunca mutável)
// ---

#[derive(Debug, Clone, Copy)]
pub struct SystemRole {
    pub slug: &'static str,
    pub label: &'static str,
    pub importance: i32,
    pub sections: &'static [Section],
}

use Section::{Ajustes, Facturas, Fichaje, Horarios, Menus, Miembros, Reservas};

pub const SYSTEM_ROLES: &[SystemRole] = &[
    SystemRole {
        slug: "root",
        label: "Superadministrador",
        importance: 100,
        sections: &[Reservas, Menus, Ajustes, Miembros, Fichaje, Horarios, Facturas],
    },
    SystemRole {
        slug: "admin",
        label: "Administrador",
        importance: 90,
        sections: &[Reservas, Menus, Ajustes, Miembros, Fichaje, Horarios, Facturas],
    },
    SystemRole {
        slug: "metre",
        label: "Metre",
        importance: 70,
        sections: &[Reservas, Menus, Fichaje, Horarios],
    },
    SystemRole {
        slug: "jefe_cocina",
        label: "Jefe de cocina",
        importance: 70,
        sections: &[Menus, Fichaje, Horarios],
    },
    SystemRole {
        slug: "responsable_sala",
        label: "Responsable de sala",
        importance: 60,
        sections: &[Reservas, Menus, Fichaje, Horarios],
    },
    SystemRole {
        slug: "arrocero",
        label: "Arrocero",
        importance: 40,
        sections: &[Reservas, Fichaje],
    },
    SystemRole {
        slug: "camarero",
        label: "Camarero",
        importance: 40,
        sections: &[Reservas, Fichaje],
    },
    SystemRole {
        slug: "barista",
        label: "Barista",
        importance: 30,
        sections: &[Fichaje],
    },
    SystemRole {
        slug: "ayudante_cocina",
        label: "Ayudante de cocina",
        importance: 30,
        sections: &[Fichaje],
    },
    SystemRole {
        slug: "ayudante_camarero",
        label: "Ayudante de camarero",
        importance: 20,
        sections: &[Fichaje],
    },
    SystemRole {
        slug: "pinche_cocina",
        label: "Pinche de cocina",
        importance: 20,
        sections: &[Fichaje],
    },
    SystemRole {
        slug: "runner",
        label: "Runner",
        importance: 15,
        sections: &[Fichaje],
    },
    SystemRole {
        slug: "fregaplatos",
        label: "Friegaplatos",
        importance: 10,
        sections: &[Fichaje],
    },
];

pub fn system_role(slug: &str) -> Option<&'static SystemRole> {
    SYSTEM_ROLES.iter().find(|r| r.slug == slug)
}

pub fn is_reserved_slug(slug: &str) -> bool {
    system_role(slug).is_some()
}

// ---
// Lookup em duas camadas
// ---

/// Fonte de configuração de cargos.
#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn importance(&self, restaurant_id: i32, role: &str) -> Result<Option<i32>, AppError>;

    async fn sections(
        &self,
        restaurant_id: i32,
        role: &str,
    ) -> Result<Option<BTreeSet<Section>>, AppError>;

    async fn roles(&self, restaurant_id: i32) -> Result<Vec<RoleView>, AppError>;
}

/// A tabela compilada de cargos do sistema.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRoleTable;

#[async_trait]
impl RoleStore for DefaultRoleTable {
    async fn importance(&self, _restaurant_id: i32, role: &str) -> Result<Option<i32>, AppError> {
        Ok(system_role(role).map(|r| r.importance))
    }

    async fn sections(
        &self,
        _restaurant_id: i32,
        role: &str,
    ) -> Result<Option<BTreeSet<Section>>, AppError> {
        Ok(system_role(role).map(|r| r.sections.iter().copied().collect()))
    }

    async fn roles(&self, _restaurant_id: i32) -> Result<Vec<RoleView>, AppError> {
        Ok(SYSTEM_ROLES
            .iter()
            .filter(|r| r.slug != ROOT_ROLE)
            .map(|r| RoleView {
                slug: r.slug.to_string(),
                label: r.label.to_string(),
                importance: r.importance,
                sections: r.sections.to_vec(),
                is_system: true,
            })
            .collect())
    }
}

/// Cargos persistidos por restaurante (tabelas bo_roles / bo_role_permissions).
#[derive(Clone)]
pub struct PgRoleStore {
    repo: RbacRepository,
}

impl PgRoleStore {
    pub fn new(repo: RbacRepository) -> Self {
        Self { repo }
    }
}

fn parse_sections(raw: impl IntoIterator<Item = String>) -> BTreeSet<Section> {
    // Seções desconhecidas no banco são ignoradas
    raw.into_iter().filter_map(|s| s.parse().ok()).collect()
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn importance(&self, restaurant_id: i32, role: &str) -> Result<Option<i32>, AppError> {
        Ok(self
            .repo
            .find_role(restaurant_id, role)
            .await?
            .map(|r| r.importance))
    }

    async fn sections(
        &self,
        restaurant_id: i32,
        role: &str,
    ) -> Result<Option<BTreeSet<Section>>, AppError> {
        Ok(self
            .repo
            .find_sections(restaurant_id, role)
            .await?
            .map(parse_sections))
    }

    async fn roles(&self, restaurant_id: i32) -> Result<Vec<RoleView>, AppError> {
        let roles = self.repo.list_roles(restaurant_id).await?;
        let mut by_role: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (slug, section) in self.repo.list_permissions(restaurant_id).await? {
            by_role.entry(slug).or_default().push(section);
        }

        Ok(roles
            .into_iter()
            .map(|r| {
                let sections = parse_sections(by_role.remove(&r.slug).unwrap_or_default());
                RoleView {
                    is_system: is_reserved_slug(&r.slug),
                    slug: r.slug,
                    label: r.label,
                    importance: r.importance,
                    sections: sections.into_iter().collect(),
                }
            })
            .collect())
    }
}

/// Decorador: consulta a camada persistida primeiro e cai para a padrão.
/// Para seções, a padrão é sempre somada (piso, nunca teto).
pub struct LayeredRoleStore<P, F> {
    persisted: P,
    defaults: F,
}

impl<P, F> LayeredRoleStore<P, F> {
    pub fn new(persisted: P, defaults: F) -> Self {
        Self { persisted, defaults }
    }
}

#[async_trait]
impl<P, F> RoleStore for LayeredRoleStore<P, F>
where
    P: RoleStore,
    F: RoleStore,
{
    async fn importance(&self, restaurant_id: i32, role: &str) -> Result<Option<i32>, AppError> {
        match self.persisted.importance(restaurant_id, role).await? {
            Some(importance) => Ok(Some(importance)),
            None => self.defaults.importance(restaurant_id, role).await,
        }
    }

    async fn sections(
        &self,
        restaurant_id: i32,
        role: &str,
    ) -> Result<Option<BTreeSet<Section>>, AppError> {
        let persisted = self.persisted.sections(restaurant_id, role).await?;
        let defaults = self.defaults.sections(restaurant_id, role).await?;

        Ok(match (persisted, defaults) {
            (Some(mut p), Some(d)) => {
                p.extend(d);
                Some(p)
            }
            (Some(p), None) => Some(p),
            (None, d) => d,
        })
    }

    async fn roles(&self, restaurant_id: i32) -> Result<Vec<RoleView>, AppError> {
        let mut merged: BTreeMap<String, RoleView> = self
            .defaults
            .roles(restaurant_id)
            .await?
            .into_iter()
            .map(|r| (r.slug.clone(), r))
            .collect();

        for role in self.persisted.roles(restaurant_id).await? {
            match merged.get_mut(&role.slug) {
                Some(existing) => {
                    existing.label = role.label;
                    existing.importance = role.importance;
                    let mut sections: BTreeSet<Section> =
                        existing.sections.iter().copied().collect();
                    sections.extend(role.sections);
                    existing.sections = sections.into_iter().collect();
                }
                None => {
                    merged.insert(role.slug.clone(), role);
                }
            }
        }

        let mut roles: Vec<RoleView> = merged.into_values().collect();
        roles.sort_by(|a, b| b.importance.cmp(&a.importance).then(a.slug.cmp(&b.slug)));
        Ok(roles)
    }
}

// ---
// Resolver
// ---

/// Responde importância / seções / acesso para um cargo num restaurante.
#[derive(Clone)]
pub struct RoleResolver {
    store: Arc<dyn RoleStore>,
}

impl RoleResolver {
    pub fn new(store: Arc<dyn RoleStore>) -> Self {
        Self { store }
    }

    /// Resolver padrão: persistido por cima da tabela do sistema.
    pub fn layered(repo: RbacRepository) -> Self {
        Self::new(Arc::new(LayeredRoleStore::new(
            PgRoleStore::new(repo),
            DefaultRoleTable,
        )))
    }

    pub async fn importance(&self, restaurant_id: i32, role: &str) -> Result<i32, AppError> {
        if role == ROOT_ROLE {
            return Ok(MAX_IMPORTANCE);
        }
        Ok(self.store.importance(restaurant_id, role).await?.unwrap_or(0))
    }

    pub async fn sections(
        &self,
        restaurant_id: i32,
        role: &str,
    ) -> Result<BTreeSet<Section>, AppError> {
        if role == ROOT_ROLE {
            return Ok(Section::ALL.into_iter().collect());
        }
        Ok(self.store.sections(restaurant_id, role).await?.unwrap_or_default())
    }

    pub async fn can_access(
        &self,
        restaurant_id: i32,
        role: &str,
        section: Section,
    ) -> Result<bool, AppError> {
        Ok(self.sections(restaurant_id, role).await?.contains(&section))
    }

    /// Um cargo existe se alguma camada o conhece.
    pub async fn role_exists(&self, restaurant_id: i32, role: &str) -> Result<bool, AppError> {
        Ok(role == ROOT_ROLE || self.store.importance(restaurant_id, role).await?.is_some())
    }

    pub async fn roles(&self, restaurant_id: i32) -> Result<Vec<RoleView>, AppError> {
        self.store.roles(restaurant_id).await
    }
}

// ---
// Guarda contra escalada de privilégio
// ---

/// Só cria cargos estritamente menos importantes que o do ator.
pub fn ensure_can_create_role(actor_importance: i32, new_importance: i32) -> Result<(), AppError> {
    if new_importance >= actor_importance {
        return Err(AppError::forbidden(
            "No puedes crear un rol con importancia igual o superior a la tuya",
        ));
    }
    Ok(())
}

/// Atribuir cargo exige superar tanto o cargo novo quanto o cargo atual do
/// alvo. Ninguém muda o próprio cargo por aqui.
pub fn ensure_can_assign_role(
    actor_user_id: i32,
    actor_importance: i32,
    target_user_id: i32,
    target_current_importance: i32,
    new_role_importance: i32,
) -> Result<(), AppError> {
    if actor_user_id == target_user_id {
        return Err(AppError::forbidden("No puedes cambiar tu propio rol"));
    }
    if new_role_importance >= actor_importance {
        return Err(AppError::forbidden(
            "No puedes asignar un rol con importancia igual o superior a la tuya",
        ));
    }
    if target_current_importance >= actor_importance {
        return Err(AppError::forbidden(
            "No puedes modificar a un usuario con importancia igual o superior a la tuya",
        ));
    }
    Ok(())
}

// ---
// Serviço
// ---

#[derive(Clone)]
pub struct RbacService {
    resolver: RoleResolver,
    repo: RbacRepository,
    tenant_repo: TenantRepository,
    member_repo: MemberRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(
        resolver: RoleResolver,
        repo: RbacRepository,
        tenant_repo: TenantRepository,
        member_repo: MemberRepository,
        pool: PgPool,
    ) -> Self {
        Self { resolver, repo, tenant_repo, member_repo, pool }
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    pub async fn effective_permissions(
        &self,
        ctx: &AuthContext,
    ) -> Result<EffectivePermissions, AppError> {
        let importance = self.resolver.importance(ctx.restaurant_id, &ctx.role).await?;
        let sections = self.resolver.sections(ctx.restaurant_id, &ctx.role).await?;
        Ok(EffectivePermissions {
            role: ctx.role.clone(),
            importance,
            sections: sections.into_iter().collect(),
        })
    }

    pub async fn list_roles(&self, restaurant_id: i32) -> Result<Vec<RoleView>, AppError> {
        self.resolver.roles(restaurant_id).await
    }

    pub async fn create_role(
        &self,
        actor: &AuthContext,
        payload: CreateRolePayload,
    ) -> Result<RoleView, AppError> {
        if is_reserved_slug(&payload.slug) {
            return Err(AppError::validation(
                "Ese identificador está reservado para un rol del sistema",
            ));
        }

        let actor_importance = self.resolver.importance(actor.restaurant_id, &actor.role).await?;
        ensure_can_create_role(actor_importance, payload.importance)?;

        let sections: BTreeSet<Section> = payload.sections.into_iter().collect();
        let section_names: Vec<String> = sections.iter().map(|s| s.as_str().to_string()).collect();

        // 1. Inicia Transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria o Cargo
        let role = self
            .repo
            .create_role(
                &mut *tx,
                actor.restaurant_id,
                &payload.slug,
                payload.label.trim(),
                payload.importance,
            )
            .await?;

        // 3. Salva as seções
        if !section_names.is_empty() {
            self.repo
                .assign_sections(&mut *tx, actor.restaurant_id, &role.slug, &section_names)
                .await?;
        }

        // 4. Commit
        tx.commit().await?;

        tracing::info!(
            restaurant_id = actor.restaurant_id,
            slug = %role.slug,
            importance = role.importance,
            "Rol creado"
        );

        Ok(RoleView {
            slug: role.slug,
            label: role.label,
            importance: role.importance,
            sections: sections.into_iter().collect(),
            is_system: false,
        })
    }

    /// Cargo atual de um usuário num restaurante, já com os defaults.
    pub async fn current_role_of(
        &self,
        user_id: i32,
        is_superadmin: bool,
        restaurant_id: i32,
    ) -> Result<Option<String>, AppError> {
        if is_superadmin {
            return Ok(Some(ROOT_ROLE.to_string()));
        }
        Ok(self
            .tenant_repo
            .find_link(user_id, restaurant_id)
            .await?
            .map(|link| link.role.unwrap_or_else(|| DEFAULT_LINKED_ROLE.to_string())))
    }

    pub async fn assign_role(
        &self,
        actor: &AuthContext,
        member_id: i32,
        role: &str,
    ) -> Result<(), AppError> {
        let restaurant_id = actor.restaurant_id;
        let role = role.trim();
        self.ensure_assignable_role(restaurant_id, role).await?;

        let member = self
            .member_repo
            .find(restaurant_id, member_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Miembro no encontrado".into()))?;

        let target_user_id = member.bo_user_id.ok_or_else(|| {
            AppError::validation("El miembro no tiene acceso al back-office")
        })?;

        self.guard_assignment(actor, target_user_id, role).await?;

        self.tenant_repo
            .upsert_link(&self.pool, target_user_id, restaurant_id, Some(role))
            .await?;

        tracing::info!(
            restaurant_id,
            member_id,
            target_user_id,
            role,
            actor = actor.user_id,
            "Rol asignado"
        );
        Ok(())
    }

    /// Aplica a guarda de atribuição para o ator sobre o usuário alvo.
    pub async fn guard_assignment(
        &self,
        actor: &AuthContext,
        target_user_id: i32,
        new_role: &str,
    ) -> Result<(), AppError> {
        let restaurant_id = actor.restaurant_id;
        let actor_importance = self.resolver.importance(restaurant_id, &actor.role).await?;
        let new_importance = self.resolver.importance(restaurant_id, new_role).await?;

        let target_is_superadmin = self.tenant_repo.is_superadmin(target_user_id).await?;
        let target_current = match self
            .current_role_of(target_user_id, target_is_superadmin, restaurant_id)
            .await?
        {
            Some(current) => self.resolver.importance(restaurant_id, &current).await?,
            None => 0,
        };

        ensure_can_assign_role(
            actor.user_id,
            actor_importance,
            target_user_id,
            target_current,
            new_importance,
        )
    }

    /// Convite para alguém que ainda não tem usuário: só o cargo novo conta.
    pub async fn guard_new_user(&self, actor: &AuthContext, new_role: &str) -> Result<(), AppError> {
        let restaurant_id = actor.restaurant_id;
        let actor_importance = self.resolver.importance(restaurant_id, &actor.role).await?;
        let new_importance = self.resolver.importance(restaurant_id, new_role).await?;

        if new_importance >= actor_importance {
            return Err(AppError::forbidden(
                "No puedes asignar un rol con importancia igual o superior a la tuya",
            ));
        }
        Ok(())
    }

    /// Cargo válido para atribuir neste restaurante (root nunca).
    pub async fn ensure_assignable_role(&self, restaurant_id: i32, role: &str) -> Result<(), AppError> {
        if role == ROOT_ROLE || !self.resolver.role_exists(restaurant_id, role).await? {
            return Err(AppError::validation("Rol inválido"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Camada persistida em memória para os testes.
    #[derive(Default)]
    struct MemoryRoleStore {
        importance: HashMap<String, i32>,
        sections: HashMap<String, BTreeSet<Section>>,
    }

    impl MemoryRoleStore {
        fn with(mut self, slug: &str, importance: Option<i32>, sections: &[Section]) -> Self {
            if let Some(i) = importance {
                self.importance.insert(slug.to_string(), i);
            }
            if !sections.is_empty() || importance.is_some() {
                self.sections
                    .insert(slug.to_string(), sections.iter().copied().collect());
            }
            self
        }
    }

    #[async_trait]
    impl RoleStore for MemoryRoleStore {
        async fn importance(&self, _: i32, role: &str) -> Result<Option<i32>, AppError> {
            Ok(self.importance.get(role).copied())
        }

        async fn sections(&self, _: i32, role: &str) -> Result<Option<BTreeSet<Section>>, AppError> {
            Ok(self.sections.get(role).cloned())
        }

        async fn roles(&self, _: i32) -> Result<Vec<RoleView>, AppError> {
            Ok(self
                .importance
                .iter()
                .map(|(slug, importance)| RoleView {
                    slug: slug.clone(),
                    label: slug.to_uppercase(),
                    importance: *importance,
                    sections: self
                        .sections
                        .get(slug)
                        .map(|s| s.iter().copied().collect())
                        .unwrap_or_default(),
                    is_system: false,
                })
                .collect())
        }
    }

    fn resolver(store: MemoryRoleStore) -> RoleResolver {
        RoleResolver::new(Arc::new(LayeredRoleStore::new(store, DefaultRoleTable)))
    }

    #[tokio::test]
    async fn falls_back_to_system_table_when_nothing_is_persisted() {
        let r = resolver(MemoryRoleStore::default());
        assert_eq!(r.importance(1, "camarero").await.unwrap(), 40);
        assert!(r.can_access(1, "camarero", Section::Reservas).await.unwrap());
        assert!(!r.can_access(1, "camarero", Section::Ajustes).await.unwrap());
        assert_eq!(r.importance(1, "desconocido").await.unwrap(), 0);
        assert!(r.sections(1, "desconocido").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persisted_importance_wins_but_default_sections_are_a_floor() {
        let store = MemoryRoleStore::default().with("camarero", Some(55), &[Section::Horarios]);
        let r = resolver(store);

        assert_eq!(r.importance(1, "camarero").await.unwrap(), 55);
        let sections = r.sections(1, "camarero").await.unwrap();
        // Persistida + padrão somadas
        assert!(sections.contains(&Section::Horarios));
        assert!(sections.contains(&Section::Reservas));
        assert!(sections.contains(&Section::Fichaje));
    }

    #[tokio::test]
    async fn custom_roles_use_only_persisted_rows() {
        let store = MemoryRoleStore::default().with("terraza", Some(35), &[Section::Reservas]);
        let r = resolver(store);
        assert_eq!(r.importance(1, "terraza").await.unwrap(), 35);
        assert_eq!(
            r.sections(1, "terraza").await.unwrap().into_iter().collect::<Vec<_>>(),
            vec![Section::Reservas]
        );
        assert!(r.role_exists(1, "terraza").await.unwrap());
        assert!(!r.role_exists(1, "fantasma").await.unwrap());
    }

    #[tokio::test]
    async fn root_short_circuits_everything() {
        let store = MemoryRoleStore::default().with("root", Some(1), &[]);
        let r = resolver(store);
        assert_eq!(r.importance(1, ROOT_ROLE).await.unwrap(), MAX_IMPORTANCE);
        assert_eq!(r.sections(1, ROOT_ROLE).await.unwrap().len(), Section::ALL.len());
    }

    #[tokio::test]
    async fn role_listing_merges_layers() {
        let store = MemoryRoleStore::default()
            .with("metre", Some(75), &[Section::Ajustes])
            .with("terraza", Some(35), &[Section::Reservas]);
        let roles = resolver(store).roles(1).await.unwrap();

        assert!(roles.iter().all(|r| r.slug != ROOT_ROLE));
        let metre = roles.iter().find(|r| r.slug == "metre").unwrap();
        assert_eq!(metre.importance, 75);
        assert!(metre.is_system);
        assert!(metre.sections.contains(&Section::Ajustes));
        assert!(metre.sections.contains(&Section::Reservas));
        assert!(roles.iter().any(|r| r.slug == "terraza" && !r.is_system));
        // Ordenado por importância decrescente
        assert_eq!(roles.first().unwrap().slug, "admin");
    }

    #[test]
    fn cannot_create_roles_at_or_above_own_importance() {
        assert!(ensure_can_create_role(50, 49).is_ok());
        assert!(ensure_can_create_role(50, 50).is_err());
        assert!(ensure_can_create_role(50, 80).is_err());
    }

    #[test]
    fn assignment_guard() {
        // Ator 50 atribuindo 40 a alguém com 30: ok
        assert!(ensure_can_assign_role(1, 50, 2, 30, 40).is_ok());
        // Cargo novo com a mesma importância (movimento lateral)
        assert!(ensure_can_assign_role(1, 50, 2, 30, 50).is_err());
        // Alvo já tão importante quanto o ator
        assert!(ensure_can_assign_role(1, 50, 2, 50, 10).is_err());
        // Próprio cargo
        assert!(ensure_can_assign_role(1, 100, 1, 0, 10).is_err());
    }

    #[test]
    fn system_slugs_are_reserved() {
        for role in SYSTEM_ROLES {
            assert!(is_reserved_slug(role.slug));
            assert!((0..=MAX_IMPORTANCE).contains(&role.importance));
        }
        assert!(!is_reserved_slug("terraza"));
        assert_eq!(SYSTEM_ROLES.len(), 13);
    }
}
