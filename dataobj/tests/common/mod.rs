#![allow(dead_code)]

use dataobj::{impl_json_type, DataObject, JsonEnum, Optional, Param, ShapeDeclaration};

/// Constructor-initialized, with one required and one optional property.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i32,
    pub name: Optional<String>,
}

impl DataObject for Account {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .init_only("id", |a: &Account| &a.id)
            .init_only("name", |a: &Account| &a.name)
            .constructor(
                vec![Param::new::<i32>("id"), Param::new::<Optional<String>>("name")],
                |args| {
                    Ok(Account {
                        id: args.next()?,
                        name: args.next()?,
                    })
                },
            );
    }
}

impl_json_type!(object Account);

/// Nullable optional: absent, explicit null and a value are all distinct.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub name: Optional<Option<String>>,
}

impl DataObject for User {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .init_only("id", |u: &User| &u.id)
            .init_only("name", |u: &User| &u.name)
            .constructor(
                vec![
                    Param::new::<i32>("id"),
                    Param::new::<Optional<Option<String>>>("name"),
                ],
                |args| {
                    Ok(User {
                        id: args.next()?,
                        name: args.next()?,
                    })
                },
            );
    }
}

impl_json_type!(object User);

/// Field-assignment initialized. `theme` is required, `volume` and `tags`
/// have declared defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub theme: String,
    pub volume: u8,
    pub tags: Vec<String>,
    pub note: Optional<Option<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: "light".to_owned(),
            volume: 5,
            tags: Vec::new(),
            note: Optional::Absent,
        }
    }
}

impl DataObject for Settings {
    fn declare(shape: &mut ShapeDeclaration<Self>) {
        shape
            .field("theme", |s: &Settings| &s.theme, |s: &mut Settings, v| s.theme = v)
            .field_with_default(
                "volume",
                |s: &Settings| &s.volume,
                |s: &mut Settings, v| s.volume = v,
                5,
            )
            .field_with_default(
                "tags",
                |s: &Settings| &s.tags,
                |s: &mut Settings, v| s.tags = v,
                Vec::new(),
            )
            .field("note", |s: &Settings| &s.note, |s: &mut Settings, v| s.note = v)
            .instantiate(Settings::default);
    }
}

impl_json_type!(object Settings);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
}

impl JsonEnum for Color {
    const VARIANTS: &'static [(Self, &'static str)] = &[
        (Color::Red, "red"),
        (Color::Green, "green"),
        (Color::Blue, "blue"),
    ];
}

impl_json_type!(enum Color);

/// Parse both documents and compare them structurally.
pub fn assert_json_eq(actual: &str, expected: &str) {
    let actual_value: serde_json::Value = serde_json::from_str(actual).unwrap();
    let expected_value: serde_json::Value = serde_json::from_str(expected).unwrap();
    assert_eq!(actual_value, expected_value, "actual: {actual}");
}
