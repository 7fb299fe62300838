/// Client address headers consulted when no user is authenticated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientHeaders {
    pub forwarded_for: Option<String>,
    pub real_ip: Option<String>,
    pub cf_connecting_ip: Option<String>,
}

impl ClientHeaders {
    /// Picks the address headers out of a raw header list. Names match
    /// case-insensitively.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut headers = Self::default();
        for (name, value) in pairs {
            let slot = match name.to_ascii_lowercase().as_str() {
                "x-forwarded-for" => &mut headers.forwarded_for,
                "x-real-ip" => &mut headers.real_ip,
                "cf-connecting-ip" => &mut headers.cf_connecting_ip,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        headers
    }

    /// First usable client address: leftmost forwarded-for entry, then the
    /// real-ip header, then the CDN header.
    pub fn client_ip(&self) -> Option<&str> {
        let forwarded = self
            .forwarded_for
            .as_deref()
            .and_then(|value| value.split(',').next())
            .map(str::trim);

        [
            forwarded,
            self.real_ip.as_deref().map(str::trim),
            self.cf_connecting_ip.as_deref().map(str::trim),
        ]
        .into_iter()
        .flatten()
        .find(|ip| !ip.is_empty())
    }
}

/// Rate limit identity: `user:<id>` when authenticated, else `ip:<addr>`.
/// Callers without any usable address share the `ip:unknown` bucket.
pub fn resolve_identity(user_id: Option<&str>, headers: &ClientHeaders) -> String {
    if let Some(user) = user_id.filter(|u| !u.is_empty()) {
        return format!("user:{user}");
    }
    format!("ip:{}", headers.client_ip().unwrap_or("unknown"))
}
