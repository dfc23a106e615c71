//! Shared fixtures: a scriptable host handle and a compiled-class factory.
#![allow(dead_code)]

use bytescope_api::{ClassId, HostHandle, LoadedClass};
use ristretto_classfile::attributes::{Attribute, Instruction, LineNumber};
use ristretto_classfile::{ClassAccessFlags, ClassFile, ConstantPool, Method, MethodAccessFlags, Version};
use std::path::PathBuf;
use std::sync::Mutex;

/// Host handle backed by fixed data, recording code-source queries
pub struct FixtureHost {
    classes: Vec<LoadedClass>,
    code_sources: Vec<(String, PathBuf)>,
    pub queries: Mutex<Vec<String>>,
}

impl FixtureHost {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            code_sources: Vec::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_class(mut self, id: u64, internal_name: &str) -> Self {
        self.classes.push(LoadedClass::new(ClassId(id), internal_name));
        self
    }

    pub fn with_code_source(mut self, internal_name: &str, path: PathBuf) -> Self {
        self.code_sources.push((internal_name.to_string(), path));
        self
    }
}

impl HostHandle for FixtureHost {
    fn loaded_classes(&self) -> Vec<LoadedClass> {
        self.classes.clone()
    }

    fn class_code_source(&self, internal_name: &str) -> Option<PathBuf> {
        self.queries.lock().unwrap().push(internal_name.to_string());
        self.code_sources
            .iter()
            .find(|(name, _)| name == internal_name)
            .map(|(_, path)| path.clone())
    }
}

/// One method and the source lines its body covers
pub struct MethodLines<'a> {
    pub name: &'a str,
    pub descriptor: &'a str,
    pub lines: &'a [u16],
}

/// Assemble a compiled class declaring the given methods and line tables
pub fn compile_class(class_name: &str, methods: &[MethodLines<'_>]) -> Vec<u8> {
    let mut constant_pool = ConstantPool::default();
    let super_class = constant_pool.add_class("java/lang/Object").unwrap();
    let this_class = constant_pool.add_class(class_name).unwrap();
    let code_name = constant_pool.add_utf8("Code").unwrap();
    let table_name = constant_pool.add_utf8("LineNumberTable").unwrap();

    let mut compiled_methods = Vec::new();
    for m in methods {
        compiled_methods.push(Method {
            access_flags: MethodAccessFlags::PUBLIC,
            name_index: constant_pool.add_utf8(m.name).unwrap(),
            descriptor_index: constant_pool.add_utf8(m.descriptor).unwrap(),
            attributes: vec![Attribute::Code {
                name_index: code_name,
                max_stack: 1,
                max_locals: 2,
                code: vec![Instruction::Return],
                exception_table: Vec::new(),
                attributes: vec![Attribute::LineNumberTable {
                    name_index: table_name,
                    line_numbers: m
                        .lines
                        .iter()
                        .map(|&line| LineNumber {
                            start_pc: 0,
                            line_number: line,
                        })
                        .collect(),
                }],
            }],
        });
    }

    let class_file = ClassFile {
        version: Version::Java21 { minor: 0 },
        constant_pool,
        access_flags: ClassAccessFlags::PUBLIC,
        this_class,
        super_class,
        methods: compiled_methods,
        ..Default::default()
    };

    let mut bytes = Vec::new();
    class_file.to_bytes(&mut bytes).unwrap();
    bytes
}
