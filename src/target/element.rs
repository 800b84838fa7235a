//! Targets addressing a class, a method or a module-level function.

use super::capability::{
    AttributeHost, BodyEditable, ContentSource, Decoratable, Deletable, MatchEditable, Movable,
    Navigable, Renameable, SignatureEditable,
};
use super::handle::Handle;
use super::{Target, TargetKind, TargetList};
use crate::cst::ElementPath;
use crate::result::EditResult;
use crate::transform::{
    AddClassAttribute, AddDecorator, AddDefinition, AddParameter, BodyPosition, ConvertToAsync,
    ConvertToSync, DefinitionSpec, DeleteDefinition, DunderKind, GenerateDunder, InsertAtMatch,
    InsertStatement, MatchPosition, ParameterSpec, RemoveClassAttribute, RemoveDecorator,
    RemoveParameter, SetReturnType, StaticToClassMethod,
};
use regex::Regex;
use std::path::PathBuf;

/// A class, possibly nested (`Outer.Inner`).
#[derive(Debug, Clone)]
pub struct ClassTarget<'s> {
    handle: Handle<'s>,
}

/// A method defined directly in a class body.
#[derive(Debug, Clone)]
pub struct MethodTarget<'s> {
    handle: Handle<'s>,
}

/// A module-level function.
#[derive(Debug, Clone)]
pub struct FunctionTarget<'s> {
    handle: Handle<'s>,
}

macro_rules! element_target {
    ($name:ident) => {
        impl<'s> $name<'s> {
            pub(crate) fn new(handle: Handle<'s>) -> Self {
                Self { handle }
            }

            /// The current path of the element; follows renames.
            pub fn path(&self) -> ElementPath {
                self.handle.path()
            }

            pub fn name(&self) -> String {
                self.handle.path().name().to_string()
            }
        }

        impl Renameable for $name<'_> {
            fn rename(&self, new_name: &str) -> EditResult {
                self.handle.rename(new_name)
            }
        }

        impl Decoratable for $name<'_> {
            fn add_decorator(&self, decorator: &str) -> EditResult {
                self.handle
                    .apply(&AddDecorator::new(self.handle.path(), decorator))
            }

            fn remove_decorator(&self, name: &str) -> EditResult {
                self.handle
                    .apply(&RemoveDecorator::new(self.handle.path(), name))
            }
        }

        impl BodyEditable for $name<'_> {
            fn insert_statement(&self, code: &str, position: BodyPosition) -> EditResult {
                self.handle
                    .apply(&InsertStatement::new(self.handle.path(), code).position(position))
            }
        }

        impl MatchEditable for $name<'_> {
            fn insert_at_match(&self, pattern: &str, code: &str, position: MatchPosition) -> EditResult {
                match InsertAtMatch::new(self.handle.path(), pattern, code, position) {
                    Ok(transformer) => self.handle.apply(&transformer),
                    Err(error) => self.handle.fail("insert at match", error),
                }
            }
        }

        impl Deletable for $name<'_> {
            fn delete(&self) -> EditResult {
                self.handle.apply(&DeleteDefinition::new(self.handle.path()))
            }
        }

        impl ContentSource for $name<'_> {
            fn exists(&self) -> bool {
                self.handle.exists()
            }

            fn file_path(&self) -> Option<PathBuf> {
                self.handle.file().ok()
            }

            fn line_number(&self) -> Option<usize> {
                self.handle.line()
            }

            fn get_content(&self) -> EditResult {
                self.handle.content()
            }
        }
    };
}

macro_rules! signature_target {
    ($name:ident) => {
        impl SignatureEditable for $name<'_> {
            fn add_parameter(&self, spec: ParameterSpec) -> EditResult {
                self.handle
                    .apply(&AddParameter::with_spec(self.handle.path(), spec))
            }

            fn remove_parameter(&self, name: &str) -> EditResult {
                self.handle
                    .apply(&RemoveParameter::new(self.handle.path(), name))
            }

            fn set_return_type(&self, annotation: &str) -> EditResult {
                self.handle
                    .apply(&SetReturnType::new(self.handle.path(), annotation))
            }

            fn convert_to_async(&self) -> EditResult {
                self.handle.apply(&ConvertToAsync::new(self.handle.path()))
            }

            fn convert_to_sync(&self) -> EditResult {
                self.handle.apply(&ConvertToSync::new(self.handle.path()))
            }
        }
    };
}

element_target!(ClassTarget);
element_target!(MethodTarget);
element_target!(FunctionTarget);
signature_target!(MethodTarget);
signature_target!(FunctionTarget);

impl<'s> ClassTarget<'s> {
    fn class_name(&self) -> String {
        match self.handle.path() {
            ElementPath::Class(name) => name,
            other => other.to_string(),
        }
    }

    /// Resolves a child element inside this class's file.
    fn child(&self, operation: &str, path: ElementPath) -> Target<'s> {
        let session = self.handle.session();
        let located = self
            .handle
            .file()
            .and_then(|file| session.resolver().resolve(&path, Some(&file)));
        match located {
            Ok(at) => Target::at(session, path, at),
            Err(error) => Target::failed(operation, &path, error),
        }
    }

    pub fn generate_init(&self) -> EditResult {
        self.generate_dunder(DunderKind::Init, false)
    }

    pub fn generate_repr(&self) -> EditResult {
        self.generate_dunder(DunderKind::Repr, false)
    }

    pub fn generate_eq(&self) -> EditResult {
        self.generate_dunder(DunderKind::Eq, false)
    }

    pub fn generate_hash(&self) -> EditResult {
        self.generate_dunder(DunderKind::Hash, false)
    }
}

impl<'s> Navigable<'s> for ClassTarget<'s> {
    fn kind(&self) -> TargetKind {
        TargetKind::Class
    }

    /// A class nested directly in this one.
    fn find_class(&self, name: &str) -> Target<'s> {
        let path = ElementPath::class(format!("{}.{name}", self.class_name()));
        self.child("find_class", path)
    }

    fn find_method(&self, name: &str) -> Target<'s> {
        self.child("find_method", ElementPath::method(self.class_name(), name))
    }

    fn find_methods(&self, pattern: &str) -> TargetList<'s> {
        let session = self.handle.session();
        let found = self.handle.file().and_then(|file| {
            let regex = Regex::new(pattern)?;
            let methods = session
                .resolver()
                .methods_of(&file, &self.class_name(), &regex)?;
            Ok((file, methods))
        });
        match found {
            Ok((file, methods)) => methods
                .into_iter()
                .map(|path| Target::bound(session, path, file.clone()))
                .collect(),
            Err(error) => {
                let path = ElementPath::method(self.class_name(), pattern);
                std::iter::once(Target::failed("find_methods", &path, error)).collect()
            }
        }
    }
}

impl AttributeHost for ClassTarget<'_> {
    fn add_attribute(&self, name: &str, annotation: Option<&str>, value: Option<&str>) -> EditResult {
        let mut transformer = AddClassAttribute::new(self.class_name(), name);
        if let Some(annotation) = annotation {
            transformer = transformer.annotation(annotation);
        }
        if let Some(value) = value {
            transformer = transformer.value(value);
        }
        self.handle.apply(&transformer)
    }

    fn remove_attribute(&self, name: &str) -> EditResult {
        self.handle
            .apply(&RemoveClassAttribute::new(self.class_name(), name))
    }

    fn add_method(&self, spec: DefinitionSpec) -> EditResult {
        self.handle
            .apply(&AddDefinition::to_class(self.class_name(), spec))
    }

    fn generate_dunder(&self, kind: DunderKind, overwrite: bool) -> EditResult {
        self.handle
            .apply(&GenerateDunder::new(self.class_name(), kind).overwrite(overwrite))
    }
}

impl Movable for ClassTarget<'_> {
    fn move_to(&self, destination: &str) -> EditResult {
        self.handle.move_to(destination)
    }
}

impl MethodTarget<'_> {
    /// Turns a `@staticmethod` into a `@classmethod` taking `cls`.
    pub fn convert_to_classmethod(&self) -> EditResult {
        self.handle
            .apply(&StaticToClassMethod::new(self.handle.path()))
    }
}

impl<'s> Navigable<'s> for MethodTarget<'s> {
    fn kind(&self) -> TargetKind {
        TargetKind::Method
    }
}

impl<'s> Navigable<'s> for FunctionTarget<'s> {
    fn kind(&self) -> TargetKind {
        TargetKind::Function
    }
}

impl Movable for FunctionTarget<'_> {
    fn move_to(&self, destination: &str) -> EditResult {
        self.handle.move_to(destination)
    }
}
