use axum::Json;
use serde::Serialize;

/// Social sign-in providers the client may offer. A closed set: adding a
/// provider means adding a variant, not a string key.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SocialProvider {
    Google,
    Facebook,
    Twitter,
    Github,
    Discord,
    Spotify,
    Auth0,
}

impl SocialProvider {
    pub const ALL: [SocialProvider; 7] = [
        SocialProvider::Google,
        SocialProvider::Facebook,
        SocialProvider::Twitter,
        SocialProvider::Github,
        SocialProvider::Discord,
        SocialProvider::Spotify,
        SocialProvider::Auth0,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SocialProvider::Google => "Google",
            SocialProvider::Facebook => "Facebook",
            SocialProvider::Twitter => "Twitter",
            SocialProvider::Github => "GitHub",
            SocialProvider::Discord => "Discord",
            SocialProvider::Spotify => "Spotify",
            SocialProvider::Auth0 => "Auth0",
        }
    }

    /// Brand color for the provider's sign-in button.
    pub fn brand_color(self) -> &'static str {
        match self {
            SocialProvider::Google => "#DB4437",
            SocialProvider::Facebook => "#4285F4",
            SocialProvider::Twitter => "#1DA1F2",
            SocialProvider::Github => "#333333",
            SocialProvider::Discord => "#7289DA",
            SocialProvider::Spotify => "#1DB954",
            SocialProvider::Auth0 => "#EB5424",
        }
    }
}

/// One row of the provider catalog served to sign-in pages.
#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: SocialProvider,
    pub label: &'static str,
    pub color: &'static str,
}

pub async fn list_providers() -> Json<Vec<ProviderInfo>> {
    Json(
        SocialProvider::ALL
            .iter()
            .map(|p| ProviderInfo {
                id: *p,
                label: p.label(),
                color: p.brand_color(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&SocialProvider::Github).unwrap(),
            "\"github\""
        );
        assert_eq!(
            serde_json::to_string(&SocialProvider::Auth0).unwrap(),
            "\"auth0\""
        );
    }

    #[test]
    fn every_provider_has_display_metadata() {
        for provider in SocialProvider::ALL {
            assert!(!provider.label().is_empty());
            assert!(provider.brand_color().starts_with('#'));
        }
    }

    #[tokio::test]
    async fn catalog_lists_all_providers() {
        let Json(catalog) = list_providers().await;
        assert_eq!(catalog.len(), SocialProvider::ALL.len());
        assert!(catalog.iter().any(|p| p.id == SocialProvider::Google));
    }
}
