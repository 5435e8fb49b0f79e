//! Reading and writing of (multi-document) YAML files. JSON input is accepted as well.
use std::{
    io::{Read as _, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize as _, Serialize, de::DeserializeOwned};
use snafu::{ResultExt as _, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read {path}", path = path.display()))]
    ReadFile {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to read from stdin"))]
    ReadStdin { source: std::io::Error },

    #[snafu(display("failed to parse document {index} of {path}", path = path.display()))]
    ParseDocument {
        source: serde_yaml::Error,
        path: PathBuf,
        index: usize,
    },

    #[snafu(display("failed to serialize YAML"))]
    SerializeYaml { source: serde_yaml::Error },

    #[snafu(display("failed to write YAML document separator"))]
    WriteDocumentSeparator { source: std::io::Error },
}

/// Reads the whole content of `path`, where `-` stands for stdin.
fn read_to_string(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context(ReadStdinSnafu)?;

        return Ok(input);
    }

    std::fs::read_to_string(path).context(ReadFileSnafu { path })
}

/// Parses every document of `input`. `path` is only used in error messages.
pub fn from_documents<T>(input: &str, path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    serde_yaml::Deserializer::from_str(input)
        .enumerate()
        .map(|(index, document)| {
            T::deserialize(document).context(ParseDocumentSnafu { path, index })
        })
        .collect()
}

/// Reads every document of the file at `path`.
pub fn read_documents<T>(path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    from_documents(&read_to_string(path)?, path)
}

/// Parses every document of `input`, logging and skipping the ones which fail to parse.
pub fn from_valid_documents<T>(input: &str, path: &Path) -> Vec<T>
where
    T: DeserializeOwned,
{
    serde_yaml::Deserializer::from_str(input)
        .enumerate()
        .filter_map(|(index, document)| {
            T::deserialize(document)
                .inspect_err(|error| {
                    tracing::warn!(
                        path = %path.display(),
                        index,
                        %error,
                        "skipping document which failed to parse"
                    );
                })
                .ok()
        })
        .collect()
}

/// Reads every document of the file at `path` which parses. See [`from_valid_documents`].
pub fn read_valid_documents<T>(path: &Path) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    Ok(from_valid_documents(&read_to_string(path)?, path))
}

/// Reads the file at `path`, which must contain exactly one document.
pub fn read_document<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    serde_yaml::from_str(&read_to_string(path)?).context(ParseDocumentSnafu {
        path,
        index: 0usize,
    })
}

/// Serializes `value` as an explicit YAML document, starting with `---`.
pub fn serialize<T, W>(value: &T, mut writer: W) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    writer
        .write_all(b"---\n")
        .context(WriteDocumentSeparatorSnafu)?;

    let mut serializer = serde_yaml::Serializer::new(writer);
    serde_yaml::with::singleton_map_recursive::serialize(value, &mut serializer)
        .context(SerializeYamlSnafu)
}

/// Serializes every value as its own explicit YAML document.
pub fn serialize_all<'a, T, I, W>(values: I, mut writer: W) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
    W: Write,
{
    for value in values {
        serialize(value, &mut writer)?;
    }

    Ok(())
}
