//! Protobuf descriptors of the CT front end configuration
//!
//! The text format needs reflection, so the `configpb` and `keyspb` messages
//! (and the `google.protobuf.Any` they embed) are described here and loaded
//! into a [`DescriptorPool`] once. Field numbers match the upstream
//! `trillian/ctfe/configpb/config.proto` and `crypto/keyspb/keyspb.proto`.

use crate::error::{Error, Result};
use prost_reflect::{DescriptorPool, MessageDescriptor};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet};
use std::sync::OnceLock;

const ANY_FILE: &str = "google/protobuf/any.proto";
const KEYSPB_FILE: &str = "crypto/keyspb/keyspb.proto";
const CONFIGPB_FILE: &str = "trillian/ctfe/configpb/config.proto";

/// Fully qualified name of the top level configuration message
pub const LOG_MULTI_CONFIG: &str = "configpb.LogMultiConfig";

fn scalar(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        ..Default::default()
    }
}

fn repeated(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..scalar(name, number, kind)
    }
}

fn message(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, Type::Message)
    }
}

fn repeated_message(name: &str, number: i32, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..message(name, number, type_name)
    }
}

fn message_type(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn file(
    name: &str,
    package: &str,
    dependency: &[&str],
    message_type: Vec<DescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()),
        dependency: dependency.iter().map(|d| d.to_string()).collect(),
        message_type,
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn file_set() -> FileDescriptorSet {
    let any = file(
        ANY_FILE,
        "google.protobuf",
        &[],
        vec![message_type(
            "Any",
            vec![
                scalar("type_url", 1, Type::String),
                scalar("value", 2, Type::Bytes),
            ],
        )],
    );

    let keyspb = file(
        KEYSPB_FILE,
        "keyspb",
        &[],
        vec![
            message_type(
                "PEMKeyFile",
                vec![
                    scalar("path", 1, Type::String),
                    scalar("password", 2, Type::String),
                ],
            ),
            message_type("PublicKey", vec![scalar("der", 1, Type::Bytes)]),
        ],
    );

    let configpb = file(
        CONFIGPB_FILE,
        "configpb",
        &[ANY_FILE, KEYSPB_FILE],
        vec![
            message_type(
                "LogBackend",
                vec![
                    scalar("name", 1, Type::String),
                    scalar("backend_spec", 2, Type::String),
                ],
            ),
            message_type(
                "LogBackendSet",
                vec![repeated_message("backend", 1, ".configpb.LogBackend")],
            ),
            message_type(
                "LogConfigSet",
                vec![repeated_message("config", 1, ".configpb.LogConfig")],
            ),
            message_type(
                "LogConfig",
                vec![
                    scalar("log_id", 1, Type::Int64),
                    scalar("prefix", 2, Type::String),
                    repeated("roots_pem_file", 3, Type::String),
                    message("private_key", 4, ".google.protobuf.Any"),
                    message("public_key", 5, ".keyspb.PublicKey"),
                    scalar("reject_expired", 6, Type::Bool),
                    repeated("ext_key_usages", 7, Type::String),
                    scalar("accept_only_ca", 10, Type::Bool),
                    scalar("log_backend_name", 11, Type::String),
                    scalar("is_mirror", 12, Type::Bool),
                    scalar("max_merge_delay_sec", 13, Type::Int32),
                    scalar("expected_merge_delay_sec", 14, Type::Int32),
                    repeated("reject_extensions", 15, Type::String),
                    scalar("is_readonly", 16, Type::Bool),
                    scalar("reject_unexpired", 17, Type::Bool),
                ],
            ),
            message_type(
                "LogMultiConfig",
                vec![
                    message("backends", 1, ".configpb.LogBackendSet"),
                    message("log_configs", 2, ".configpb.LogConfigSet"),
                ],
            ),
        ],
    );

    FileDescriptorSet {
        file: vec![any, keyspb, configpb],
    }
}

fn pool() -> Result<&'static DescriptorPool> {
    static POOL: OnceLock<DescriptorPool> = OnceLock::new();
    if let Some(pool) = POOL.get() {
        return Ok(pool);
    }
    let pool = DescriptorPool::from_file_descriptor_set(file_set())?;
    Ok(POOL.get_or_init(|| pool))
}

/// Descriptor of a message in the configuration schema
pub fn message_descriptor(full_name: &str) -> Result<MessageDescriptor> {
    pool()?
        .get_message_by_name(full_name)
        .ok_or_else(|| Error::Schema(format!("unknown message type {}", full_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_loads() {
        let descriptor = message_descriptor(LOG_MULTI_CONFIG).unwrap();
        let names: Vec<_> = descriptor.fields().map(|f| f.name().to_string()).collect();
        assert_eq!(names, vec!["backends", "log_configs"]);

        let log = message_descriptor("configpb.LogConfig").unwrap();
        assert_eq!(log.get_field_by_name("log_backend_name").unwrap().number(), 11);
        assert!(log.get_field_by_name("roots_pem_file").unwrap().is_list());
    }

    #[test]
    fn test_unknown_message() {
        assert!(matches!(
            message_descriptor("configpb.Nope"),
            Err(Error::Schema(_))
        ));
    }
}
