//! Transaction messages understood by the pipeline.

use serde::{Deserialize, Serialize};

/// A single source file of a deployed package.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MemFile {
    pub name: String,
    pub body: String,
}

/// A package carried inline by a deploy or run message.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MemPackage {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub files: Vec<MemFile>,
}

impl MemPackage {
    pub fn file(&self, name: &str) -> Option<&MemFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// Decoded transaction message.
///
/// Kinds the pipeline does not act on are kept as [`Message::Unknown`] so callers
/// can match exhaustively and ignore them explicitly.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    /// Deploys a new package at `package.path`.
    AddPackage {
        creator: String,
        package: MemPackage,
        deposit: String,
    },

    /// Calls an exported function of a deployed realm.
    Call {
        caller: String,
        pkg_path: String,
        func: String,
        args: Vec<String>,
        send: String,
    },

    /// Plain coin transfer.
    Send {
        from: String,
        to: String,
        amount: String,
    },

    /// Runs an ephemeral package without deploying it.
    Run { caller: String, package: MemPackage },

    Unknown { type_url: String },
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::AddPackage { .. } => "add_package",
            Message::Call { .. } => "call",
            Message::Send { .. } => "send",
            Message::Run { .. } => "run",
            Message::Unknown { .. } => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_tag() {
        let msg = Message::AddPackage {
            creator: "g1creator".to_string(),
            package: MemPackage {
                name: "foo".to_string(),
                path: "gno.land/r/demo/foo".to_string(),
                files: vec![MemFile {
                    name: "foo.gno".to_string(),
                    body: "package foo".to_string(),
                }],
            },
            deposit: String::new(),
        };
        assert_eq!(msg.kind(), "add_package");

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "add_package");
        assert_eq!(json["package"]["path"], "gno.land/r/demo/foo");
    }

    #[test]
    fn test_mem_package_file_lookup() {
        let pkg = MemPackage {
            name: "foo".to_string(),
            path: "gno.land/r/demo/foo".to_string(),
            files: vec![MemFile {
                name: "foo.gno".to_string(),
                body: "package foo".to_string(),
            }],
        };
        assert!(pkg.file("foo.gno").is_some());
        assert!(pkg.file("bar.gno").is_none());
    }
}
