use serde::{Deserialize, Serialize};

pub const HOME: &str = "/";
pub const ADMIN_LOGIN: &str = "/admin";
pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";

/// Client-side routes of the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", content = "param", rename_all = "snake_case")]
pub enum Route {
    Home,
    About,
    Projects,
    Project(String),
    Blog,
    BlogPost(String),
    Contact,
    Certifications,
    CodingProfile,
    AdminLogin,
    AdminDashboard,
}

impl Route {
    /// Matches a path; a trailing slash is ignored. Unknown paths give `None`.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match segments.as_slice() {
            [] => Route::Home,
            ["about"] => Route::About,
            ["projects"] => Route::Projects,
            ["projects", id] => Route::Project(id.to_string()),
            ["blog"] => Route::Blog,
            ["blog", slug] => Route::BlogPost(slug.to_string()),
            ["contact"] => Route::Contact,
            ["certifications"] => Route::Certifications,
            ["coding-profile"] => Route::CodingProfile,
            ["admin"] => Route::AdminLogin,
            ["admin", "dashboard"] => Route::AdminDashboard,
            _ => return None,
        };
        Some(route)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Access {
    pub authenticated: bool,
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Render { route: Route },
    Redirect { to: &'static str },
    NotFound,
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn decide(path: &str, access: Access) -> Decision {
        let Some(route) = Route::parse(path) else {
            return Decision::NotFound;
        };
        let is_admin = access.authenticated && access.is_admin;

        match route {
            Route::AdminDashboard if !is_admin => Decision::Redirect { to: HOME },
            Route::AdminLogin if is_admin => Decision::Redirect { to: ADMIN_DASHBOARD },
            route => Decision::Render { route },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADMIN: Access = Access { authenticated: true, is_admin: true };
    const VISITOR: Access = Access { authenticated: false, is_admin: false };
    const SIGNED_IN: Access = Access { authenticated: true, is_admin: false };

    #[test]
    fn public_routes_render_for_everyone() {
        for path in ["/", "/about", "/projects", "/blog", "/contact", "/certifications", "/coding-profile"] {
            assert!(matches!(RouteGuard::decide(path, VISITOR), Decision::Render { .. }), "{path}");
        }
        assert_eq!(
            RouteGuard::decide("/blog/hello-world/", VISITOR),
            Decision::Render { route: Route::BlogPost("hello-world".into()) }
        );
    }

    #[test]
    fn dashboard_needs_the_admin_role() {
        assert_eq!(RouteGuard::decide("/admin/dashboard", VISITOR), Decision::Redirect { to: HOME });
        assert_eq!(RouteGuard::decide("/admin/dashboard", SIGNED_IN), Decision::Redirect { to: HOME });
        assert_eq!(
            RouteGuard::decide("/admin/dashboard", ADMIN),
            Decision::Render { route: Route::AdminDashboard }
        );
    }

    #[test]
    fn signed_in_admin_skips_the_login_page() {
        assert_eq!(RouteGuard::decide("/admin", ADMIN), Decision::Redirect { to: ADMIN_DASHBOARD });
        assert_eq!(RouteGuard::decide("/admin", VISITOR), Decision::Render { route: Route::AdminLogin });
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(RouteGuard::decide("/projects/1/edit", ADMIN), Decision::NotFound);
        assert_eq!(RouteGuard::decide("/nope", VISITOR), Decision::NotFound);
    }
}
