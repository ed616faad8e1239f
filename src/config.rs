// src/config.rs

use std::{env, str::FromStr, sync::Arc, time::Duration as StdDuration};

use anyhow::Context;
use chrono::Duration;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        BookingRepository, FichajeRepository, GroupMenuRepository, MemberRepository, RbacRepository,
        SessionRepository, SettingsRepository, TenantRepository, TokenRepository, UserRepository,
    },
    services::{
        auth::AuthService,
        booking_normalizer::{BookingNormalizer, PgBookingLookups},
        booking_service::BookingService,
        fichaje_service::FichajeService,
        member_service::MemberService,
        menu_service::MenuService,
        notifications::{Notifier, SmtpConfig, WhatsAppConfig},
        rbac_service::{RbacService, RoleResolver},
        settings_service::SettingsService,
        token_service::TokenService,
    },
    ws::FichajeHub,
};

const DEFAULT_HIGH_SECURITY_PREFIXES: &str = "/api/roles,/api/members,/api/invoices";

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub session_cookie_name: String,
    pub session_ttl: Duration,
    pub high_security_ttl: Duration,
    pub high_security_path_prefixes: Vec<String>,
    /// Força `Secure` no cookie mesmo sem `X-Forwarded-Proto: https`.
    pub cookie_secure: bool,
    pub invite_ttl: Duration,
    pub password_reset_ttl: Duration,
    pub public_base_url: String,
    pub fichaje_sweep_interval: StdDuration,
    pub smtp: Option<SmtpConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            bind_addr: "0.0.0.0:3000".to_string(),
            db_max_connections: 5,
            session_cookie_name: "bo_session".to_string(),
            session_ttl: Duration::hours(24 * 30),
            high_security_ttl: Duration::minutes(30),
            high_security_path_prefixes: parse_prefixes(DEFAULT_HIGH_SECURITY_PREFIXES),
            cookie_secure: false,
            invite_ttl: Duration::hours(72),
            password_reset_ttl: Duration::minutes(60),
            public_base_url: "http://localhost:5173".to_string(),
            fichaje_sweep_interval: StdDuration::from_secs(300),
            smtp: None,
            whatsapp: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", defaults.db_max_connections)?,
            session_cookie_name: env::var("SESSION_COOKIE_NAME").unwrap_or(defaults.session_cookie_name),
            session_ttl: Duration::hours(env_or("SESSION_TTL_HOURS", defaults.session_ttl.num_hours())?),
            high_security_ttl: Duration::minutes(env_or(
                "HIGH_SECURITY_TTL_MINUTES",
                defaults.high_security_ttl.num_minutes(),
            )?),
            high_security_path_prefixes: env::var("HIGH_SECURITY_PATH_PREFIXES")
                .map(|v| parse_prefixes(&v))
                .unwrap_or(defaults.high_security_path_prefixes),
            cookie_secure: env_or("COOKIE_SECURE", defaults.cookie_secure)?,
            invite_ttl: Duration::hours(env_or("INVITE_TTL_HOURS", defaults.invite_ttl.num_hours())?),
            password_reset_ttl: Duration::minutes(env_or(
                "PASSWORD_RESET_TTL_MINUTES",
                defaults.password_reset_ttl.num_minutes(),
            )?),
            public_base_url: env::var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            fichaje_sweep_interval: StdDuration::from_secs(env_or(
                "FICHAJE_SWEEP_INTERVAL_SECS",
                defaults.fichaje_sweep_interval.as_secs(),
            )?),
            smtp: SmtpConfig::from_env(),
            whatsapp: WhatsAppConfig::from_env(),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key} inválida: {e}")),
        _ => Ok(default),
    }
}

pub fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub session_repo: SessionRepository,
    pub auth_service: AuthService,
    pub rbac_service: RbacService,
    pub token_service: TokenService,
    pub booking_service: BookingService,
    pub member_service: MemberService,
    pub menu_service: MenuService,
    pub settings_service: SettingsService,
    pub fichaje_service: FichajeService,
    pub fichaje_hub: Arc<FichajeHub>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(StdDuration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(config, db_pool))
    }

    /// Monta o grafo de dependências sobre um pool já criado.
    pub fn from_pool(config: Config, db_pool: PgPool) -> Self {
        let notifier = Notifier::from_config(config.smtp.as_ref(), config.whatsapp.as_ref());
        if config.smtp.is_none() {
            tracing::warn!("SMTP não configurado: convites e resets não serão enviados por e-mail");
        }
        if config.whatsapp.is_none() {
            tracing::warn!("WhatsApp não configurado: recordatórios desativados");
        }

        // --- Repositórios ---
        let user_repo = UserRepository::new(db_pool.clone());
        let session_repo = SessionRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new(db_pool.clone());
        let token_repo = TokenRepository::new();
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let member_repo = MemberRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());
        let menu_repo = GroupMenuRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let fichaje_repo = FichajeRepository::new(db_pool.clone());

        // --- Serviços ---
        let resolver = RoleResolver::layered(rbac_repo.clone());
        let rbac_service = RbacService::new(
            resolver.clone(),
            rbac_repo,
            tenant_repo.clone(),
            member_repo.clone(),
            db_pool.clone(),
        );
        let auth_service = AuthService::new(
            user_repo.clone(),
            session_repo.clone(),
            tenant_repo.clone(),
            token_repo.clone(),
            db_pool.clone(),
            config.session_ttl,
        );
        let token_service = TokenService::new(
            user_repo,
            tenant_repo,
            member_repo.clone(),
            token_repo,
            session_repo.clone(),
            rbac_service.clone(),
            notifier.clone(),
            db_pool.clone(),
            config.invite_ttl,
            config.password_reset_ttl,
            config.public_base_url.clone(),
        );
        let normalizer = BookingNormalizer::new(Arc::new(PgBookingLookups::new(
            settings_repo.clone(),
            menu_repo.clone(),
        )));
        let booking_service = BookingService::new(booking_repo, normalizer, notifier, db_pool.clone());
        let fichaje_hub = Arc::new(FichajeHub::new());
        let fichaje_service = FichajeService::new(
            fichaje_repo,
            member_repo.clone(),
            resolver,
            fichaje_hub.clone(),
        );

        Self {
            config: Arc::new(config),
            session_repo,
            auth_service,
            rbac_service,
            token_service,
            booking_service,
            member_service: MemberService::new(member_repo),
            menu_service: MenuService::new(menu_repo),
            settings_service: SettingsService::new(settings_repo, db_pool.clone()),
            fichaje_service,
            fichaje_hub,
            db_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_trimmed_and_skip_empties() {
        assert_eq!(
            parse_prefixes(" /api/roles , ,/api/invoices"),
            vec!["/api/roles".to_string(), "/api/invoices".to_string()]
        );
    }

    #[test]
    fn defaults_cover_the_sensitive_routes() {
        let config = Config::default();
        assert!(config.high_security_path_prefixes.contains(&"/api/members".to_string()));
        assert!(config.high_security_ttl < config.session_ttl);
    }
}
