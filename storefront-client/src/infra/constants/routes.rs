macro_rules! api_path {
    ($path:literal) => {
        concat!("/api", $path)
    };
}

/// Backend route definitions consumed by the storefront client
pub mod api {
    pub const ROOT: &str = "/api";

    pub mod auth {
        /// Public; returns `{ token, role }`.
        pub const LOGIN: &str = api_path!("/auth/login");
    }

    pub mod users {
        pub const CURRENT: &str = api_path!("/users/me");
    }

    pub mod orders {
        pub const COLLECTION: &str = api_path!("/orders");
    }

    pub mod quotes {
        pub const COLLECTION: &str = api_path!("/quotes");
    }

    pub mod products {
        pub const COLLECTION: &str = api_path!("/products");
    }
}
