//! Reader for the JVM class-file format.
//!
//! Only the parts testcop needs are kept: the class and super class names,
//! interfaces, and the access flags, names and runtime annotations of
//! fields and methods. Everything else is skipped by length.

use thiserror::Error;

pub const MAGIC: u32 = 0xCAFE_BABE;

pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_BRIDGE: u16 = 0x0040;
pub const ACC_SYNTHETIC: u16 = 0x1000;

const RUNTIME_ANNOTATIONS: &[&str] = &[
    "RuntimeVisibleAnnotations",
    "RuntimeInvisibleAnnotations",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("not a class file (magic {0:#010x})")]
    BadMagic(u32),

    #[error("unexpected end of class file at offset {0}")]
    Truncated(usize),

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: usize },

    #[error("constant pool index {index} is not a {expected}")]
    BadIndex { index: u16, expected: &'static str },

    #[error("unknown annotation element tag '{0}'")]
    UnknownElement(char),
}

/// A parsed class file. Class names are in binary form, e.g. `com/example/Cheese`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub access: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<Member>,
    pub methods: Vec<Member>,
}

/// A field or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    /// Annotation type descriptors, e.g. `Lorg/junit/jupiter/api/Test;`.
    pub annotations: Vec<String>,
}

impl Member {
    pub fn is_static(&self) -> bool {
        self.access & ACC_STATIC != 0
    }

    pub fn is_synthetic(&self) -> bool {
        self.access & ACC_SYNTHETIC != 0
    }

    pub fn is_bridge(&self) -> bool {
        self.access & ACC_BRIDGE != 0
    }

    /// Simple names of the annotation types, e.g. `Test`.
    pub fn annotation_names(&self) -> impl Iterator<Item = &str> {
        self.annotations.iter().map(|d| {
            let binary = d
                .strip_prefix('L')
                .and_then(|d| d.strip_suffix(';'))
                .unwrap_or(d);
            simple_name(binary)
        })
    }
}

/// Last segment of a binary class name, after any package and outer class.
pub fn simple_name(binary: &str) -> &str {
    binary.rsplit(['/', '$']).next().unwrap_or(binary)
}

#[derive(Debug, Clone)]
enum Constant {
    Utf8(String),
    Class(u16),
    Other,
    /// Second slot of a long or double.
    Unusable,
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        let end = end.ok_or(ClassFileError::Truncated(self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFileError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFileError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

struct ConstantPool(Vec<Constant>);

impl ConstantPool {
    fn read(r: &mut Reader<'_>) -> Result<Self, ClassFileError> {
        let count = usize::from(r.u16()?);
        let mut pool = vec![Constant::Unusable];
        let mut index = 1usize;
        while index < count {
            let tag = r.u8()?;
            let constant = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    Constant::Utf8(String::from_utf8_lossy(r.take(len)?).into_owned())
                }
                7 => Constant::Class(r.u16()?),
                3 | 4 => {
                    r.take(4)?;
                    Constant::Other
                }
                5 | 6 => {
                    r.take(8)?;
                    Constant::Other
                }
                8 | 16 | 19 | 20 => {
                    r.take(2)?;
                    Constant::Other
                }
                9 | 10 | 11 | 12 | 17 | 18 => {
                    r.take(4)?;
                    Constant::Other
                }
                15 => {
                    r.take(3)?;
                    Constant::Other
                }
                tag => return Err(ClassFileError::UnknownTag { tag, index }),
            };
            pool.push(constant);
            index += 1;
            if matches!(tag, 5 | 6) {
                pool.push(Constant::Unusable);
                index += 1;
            }
        }
        Ok(Self(pool))
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Utf8(s)) => Ok(s),
            _ => Err(ClassFileError::BadIndex {
                index,
                expected: "Utf8",
            }),
        }
    }

    fn class(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.0.get(index as usize) {
            Some(Constant::Class(name)) => self.utf8(*name),
            _ => Err(ClassFileError::BadIndex {
                index,
                expected: "Class",
            }),
        }
    }
}

/// Parse a class file.
pub fn parse(bytes: &[u8]) -> Result<ClassFile, ClassFileError> {
    let mut r = Reader { bytes, pos: 0 };
    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    // minor and major version
    r.take(4)?;

    let pool = ConstantPool::read(&mut r)?;
    let access = r.u16()?;
    let this_class = pool.class(r.u16()?)?.to_string();
    let super_class = match r.u16()? {
        0 => None,
        index => Some(pool.class(index)?.to_string()),
    };

    let interface_count = r.u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class(r.u16()?)?.to_string());
    }

    let fields = read_members(&mut r, &pool)?;
    let methods = read_members(&mut r, &pool)?;

    Ok(ClassFile {
        access,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
    })
}

fn read_members(r: &mut Reader<'_>, pool: &ConstantPool) -> Result<Vec<Member>, ClassFileError> {
    let count = r.u16()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let access = r.u16()?;
        let name = pool.utf8(r.u16()?)?.to_string();
        let descriptor = pool.utf8(r.u16()?)?.to_string();
        let mut annotations = Vec::new();
        let attribute_count = r.u16()?;
        for _ in 0..attribute_count {
            let attribute = pool.utf8(r.u16()?)?;
            let len = r.u32()? as usize;
            let body = r.take(len)?;
            if RUNTIME_ANNOTATIONS.contains(&attribute) {
                let mut body = Reader { bytes: body, pos: 0 };
                read_annotations(&mut body, pool, &mut annotations)?;
            }
        }
        members.push(Member {
            access,
            name,
            descriptor,
            annotations,
        });
    }
    // class attributes follow the methods and are not needed
    Ok(members)
}

fn read_annotations(
    r: &mut Reader<'_>,
    pool: &ConstantPool,
    out: &mut Vec<String>,
) -> Result<(), ClassFileError> {
    let count = r.u16()?;
    for _ in 0..count {
        out.push(read_annotation(r, pool)?);
    }
    Ok(())
}

/// Read one annotation and return its type descriptor.
fn read_annotation(r: &mut Reader<'_>, pool: &ConstantPool) -> Result<String, ClassFileError> {
    let descriptor = pool.utf8(r.u16()?)?.to_string();
    let pairs = r.u16()?;
    for _ in 0..pairs {
        r.u16()?;
        skip_element_value(r, pool)?;
    }
    Ok(descriptor)
}

fn skip_element_value(r: &mut Reader<'_>, pool: &ConstantPool) -> Result<(), ClassFileError> {
    match r.u8()? as char {
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 's' | 'c' => {
            r.u16()?;
        }
        'e' => {
            r.take(4)?;
        }
        '@' => {
            read_annotation(r, pool)?;
        }
        '[' => {
            let count = r.u16()?;
            for _ in 0..count {
                skip_element_value(r, pool)?;
            }
        }
        other => return Err(ClassFileError::UnknownElement(other)),
    }
    Ok(())
}
