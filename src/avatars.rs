//! Avatar URLs served by the backend. Nothing here performs a request.

use url::form_urlencoded;

#[derive(Clone, Debug)]
pub struct Avatars {
    endpoint: String,
    project_id: String,
}

impl Avatars {
    pub fn new(endpoint: &str, project_id: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            project_id: project_id.to_string(),
        }
    }

    /// URL of a placeholder image showing the initials of `name`.
    pub fn initials_url(&self, name: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("name", name)
            .append_pair("project", &self.project_id)
            .finish();
        format!("{}/avatars/initials?{}", self.endpoint, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initials_url_is_deterministic() {
        let avatars = Avatars::new("https://cloud.appwrite.io/v1", "food");
        let url = avatars.initials_url("Ada Lovelace");
        assert_eq!(
            url,
            "https://cloud.appwrite.io/v1/avatars/initials?name=Ada+Lovelace&project=food"
        );
        assert_eq!(url, avatars.initials_url("Ada Lovelace"));
    }
}
