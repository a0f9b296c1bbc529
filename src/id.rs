use serde::{Deserialize, Deserializer};

/// Declares a GitLab numeric identifier. GitLab ids are global unless noted
/// otherwise; `iid`s are kept as plain integers on the owning record.
macro_rules! gitlab_id {
    ($($name:ident),+ $(,)?) => {$(
        #[derive(Debug, Default, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
        pub struct $name {
            value: u64,
        }

        impl $name {
            pub fn new(id: u64) -> Self { Self { value: id } }

            pub fn value(&self) -> u64 { self.value }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<$name, D::Error>
                where D: Deserializer<'de>,
            {
                let id = u64::deserialize(deserializer)?;
                Ok($name::new(id))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.value)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map($name::new)
            }
        }
    )+};
}

gitlab_id!(ProjectId, IssueId, RepositoryId, PackageId, PackageFileId, UserId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_and_display() {
        let id: ProjectId = serde_json::from_str("4711").unwrap();
        assert_eq!(id, ProjectId::new(4711));
        assert_eq!(id.to_string(), "4711");
    }

    #[test]
    fn test_parse_from_cli_argument() {
        assert_eq!(" 12 ".parse::<RepositoryId>().unwrap(), RepositoryId::new(12));
        assert!("twelve".parse::<PackageId>().is_err());
    }
}
