//! Static prefix route table
//!
//! A route owns one path prefix and one backend base URL. Lookup is by
//! longest matching prefix on segment boundaries, so `/auth` matches `/auth`
//! and `/auth/login` but never `/authx`.

use crate::config::RouteConfig;

/// A single prefix-to-backend mapping
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    prefix: String,
    upstream: String,
}

impl Route {
    pub fn new(prefix: impl Into<String>, upstream: impl Into<String>) -> Self {
        let upstream: String = upstream.into();
        Self {
            prefix: prefix.into(),
            upstream: upstream.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Whether `path` falls under this route's prefix
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Build the backend URL for an inbound path and query
    ///
    /// The prefix is stripped once and everything after it is kept byte for
    /// byte. An empty remainder becomes `/`.
    ///
    /// # Example
    ///
    /// ```
    /// use authgate::gateway::Route;
    ///
    /// let route = Route::new("/auth", "http://auth:8001");
    /// assert_eq!(route.upstream_url("/auth/login?x=1"), "http://auth:8001/login?x=1");
    /// assert_eq!(route.upstream_url("/auth"), "http://auth:8001/");
    /// ```
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        let rest = path_and_query
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(path_and_query);

        if rest.is_empty() || rest.starts_with('?') {
            format!("{}/{}", self.upstream, rest)
        } else {
            format!("{}{}", self.upstream, rest)
        }
    }
}

impl From<&RouteConfig> for Route {
    fn from(config: &RouteConfig) -> Self {
        Route::new(config.prefix.clone(), config.upstream.clone())
    }
}

/// Immutable route table, ordered longest prefix first
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(mut routes: Vec<Route>) -> Self {
        routes.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));
        Self { routes }
    }

    pub fn from_config(routes: &[RouteConfig]) -> Self {
        Self::new(routes.iter().map(Route::from).collect())
    }

    /// Find the route with the longest prefix matching `path`
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(path))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
