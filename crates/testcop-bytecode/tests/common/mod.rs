//! Minimal class-file writer for building fixtures in tests.

#![allow(dead_code)]

use std::collections::HashMap;

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_BRIDGE: u16 = 0x0040;
pub const ACC_SYNTHETIC: u16 = 0x1000;

pub const TEST: &str = "Lorg/junit/jupiter/api/Test;";
pub const PARAMETERIZED_TEST: &str = "Lorg/junit/jupiter/params/ParameterizedTest;";

pub enum Element {
    Str(&'static str),
    Int(i32),
    Enum(&'static str, &'static str),
    Array(Vec<Element>),
    Nested(Annotation),
}

pub struct Annotation {
    pub descriptor: &'static str,
    pub elements: Vec<(&'static str, Element)>,
}

impl Annotation {
    pub fn marker(descriptor: &'static str) -> Self {
        Self {
            descriptor,
            elements: Vec::new(),
        }
    }

    pub fn with(mut self, name: &'static str, element: Element) -> Self {
        self.elements.push((name, element));
        self
    }
}

struct MemberDef {
    access: u16,
    name: String,
    descriptor: String,
    visible: Vec<Annotation>,
    invisible: Vec<Annotation>,
}

#[derive(Default)]
struct Pool {
    bytes: Vec<u8>,
    next: u16,
    utf8: HashMap<String, u16>,
    classes: HashMap<String, u16>,
}

impl Pool {
    fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    fn utf8(&mut self, s: &str) -> u16 {
        if let Some(index) = self.utf8.get(s) {
            return *index;
        }
        self.bytes.push(1);
        self.bytes.extend((s.len() as u16).to_be_bytes());
        self.bytes.extend(s.as_bytes());
        let index = self.next;
        self.next += 1;
        self.utf8.insert(s.to_string(), index);
        index
    }

    fn class(&mut self, name: &str) -> u16 {
        if let Some(index) = self.classes.get(name) {
            return *index;
        }
        let name_index = self.utf8(name);
        self.bytes.push(7);
        self.bytes.extend(name_index.to_be_bytes());
        let index = self.next;
        self.next += 1;
        self.classes.insert(name.to_string(), index);
        index
    }

    fn long(&mut self, value: i64) {
        self.bytes.push(5);
        self.bytes.extend(value.to_be_bytes());
        self.next += 2;
    }

    fn integer(&mut self, value: i32) -> u16 {
        self.bytes.push(3);
        self.bytes.extend(value.to_be_bytes());
        let index = self.next;
        self.next += 1;
        index
    }

    fn method_ref(&mut self) {
        let class = self.class("java/lang/Object");
        let name = self.utf8("toString");
        let descriptor = self.utf8("()Ljava/lang/String;");
        self.bytes.push(12);
        self.bytes.extend(name.to_be_bytes());
        self.bytes.extend(descriptor.to_be_bytes());
        let name_and_type = self.next;
        self.next += 1;
        self.bytes.push(10);
        self.bytes.extend(class.to_be_bytes());
        self.bytes.extend(name_and_type.to_be_bytes());
        self.next += 1;
    }
}

/// Builds the bytes of a class file.
pub struct ClassWriter {
    this: String,
    super_class: Option<String>,
    interfaces: Vec<String>,
    fields: Vec<MemberDef>,
    methods: Vec<MemberDef>,
}

impl ClassWriter {
    pub fn new(this: &str) -> Self {
        Self {
            this: this.to_string(),
            super_class: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn extends(mut self, super_class: &str) -> Self {
        self.super_class = Some(super_class.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn field(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.fields.push(MemberDef {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            visible: Vec::new(),
            invisible: Vec::new(),
        });
        self
    }

    pub fn method(self, access: u16, name: &str) -> Self {
        self.annotated_method(access, name, Vec::new())
    }

    pub fn test_method(self, name: &str) -> Self {
        self.annotated_method(0, name, vec![Annotation::marker(TEST)])
    }

    pub fn annotated_method(mut self, access: u16, name: &str, visible: Vec<Annotation>) -> Self {
        self.methods.push(MemberDef {
            access,
            name: name.to_string(),
            descriptor: "()V".to_string(),
            visible,
            invisible: Vec::new(),
        });
        self
    }

    pub fn invisible_annotated_method(mut self, name: &str, invisible: Vec<Annotation>) -> Self {
        self.methods.push(MemberDef {
            access: 0,
            name: name.to_string(),
            descriptor: "()V".to_string(),
            visible: Vec::new(),
            invisible,
        });
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut pool = Pool::new();
        pool.long(42);
        pool.method_ref();

        let mut body = Vec::new();
        body.extend((ACC_PUBLIC | 0x0020).to_be_bytes());
        body.extend(pool.class(&self.this).to_be_bytes());
        let super_index = match &self.super_class {
            Some(s) => pool.class(s),
            None => 0,
        };
        body.extend(super_index.to_be_bytes());
        body.extend((self.interfaces.len() as u16).to_be_bytes());
        for interface in &self.interfaces {
            body.extend(pool.class(interface).to_be_bytes());
        }
        for members in [&self.fields, &self.methods] {
            body.extend((members.len() as u16).to_be_bytes());
            for member in members {
                write_member(&mut pool, member, &mut body);
            }
        }
        let source_file = pool.utf8("SourceFile");
        let file_name = pool.utf8("Fixture.java");
        body.extend(1u16.to_be_bytes());
        body.extend(source_file.to_be_bytes());
        body.extend(2u32.to_be_bytes());
        body.extend(file_name.to_be_bytes());

        let mut bytes = Vec::new();
        bytes.extend(0xCAFE_BABEu32.to_be_bytes());
        bytes.extend(0u16.to_be_bytes());
        bytes.extend(61u16.to_be_bytes());
        bytes.extend(pool.next.to_be_bytes());
        bytes.extend(&pool.bytes);
        bytes.extend(body);
        bytes
    }
}

fn write_member(pool: &mut Pool, member: &MemberDef, out: &mut Vec<u8>) {
    out.extend(member.access.to_be_bytes());
    out.extend(pool.utf8(&member.name).to_be_bytes());
    out.extend(pool.utf8(&member.descriptor).to_be_bytes());

    let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
    let deprecated = pool.utf8("Deprecated");
    attributes.push((deprecated, Vec::new()));
    for (name, annotations) in [
        ("RuntimeVisibleAnnotations", &member.visible),
        ("RuntimeInvisibleAnnotations", &member.invisible),
    ] {
        if annotations.is_empty() {
            continue;
        }
        let mut data = Vec::new();
        data.extend((annotations.len() as u16).to_be_bytes());
        for annotation in annotations {
            write_annotation(pool, annotation, &mut data);
        }
        attributes.push((pool.utf8(name), data));
    }

    out.extend((attributes.len() as u16).to_be_bytes());
    for (name, data) in attributes {
        out.extend(name.to_be_bytes());
        out.extend((data.len() as u32).to_be_bytes());
        out.extend(data);
    }
}

fn write_annotation(pool: &mut Pool, annotation: &Annotation, out: &mut Vec<u8>) {
    out.extend(pool.utf8(annotation.descriptor).to_be_bytes());
    out.extend((annotation.elements.len() as u16).to_be_bytes());
    for (name, element) in &annotation.elements {
        out.extend(pool.utf8(name).to_be_bytes());
        write_element(pool, element, out);
    }
}

fn write_element(pool: &mut Pool, element: &Element, out: &mut Vec<u8>) {
    match element {
        Element::Str(s) => {
            out.push(b's');
            out.extend(pool.utf8(s).to_be_bytes());
        }
        Element::Int(i) => {
            out.push(b'I');
            out.extend(pool.integer(*i).to_be_bytes());
        }
        Element::Enum(ty, constant) => {
            out.push(b'e');
            out.extend(pool.utf8(ty).to_be_bytes());
            out.extend(pool.utf8(constant).to_be_bytes());
        }
        Element::Array(values) => {
            out.push(b'[');
            out.extend((values.len() as u16).to_be_bytes());
            for value in values {
                write_element(pool, value, out);
            }
        }
        Element::Nested(annotation) => {
            out.push(b'@');
            write_annotation(pool, annotation, out);
        }
    }
}
