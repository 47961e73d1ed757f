use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::ast::{Attribute, Block, Body, BodyItem};
use crate::error::{DecodeError, JobspecError};
use crate::eval::EvalContext;
use crate::job::{Constraint, Job, Resources, Task, TaskGroup};
use crate::value::Value;

mod conversion;

/// Top-level block types that are consumed before decoding.
const VARIABLE: &str = "variable";

/// Declarative field table for one block type.
struct Schema {
    name: &'static str,
    attributes: &'static [AttrSpec],
    blocks: &'static [BlockSpec],
}

struct AttrSpec {
    name: &'static str,
    required: bool,
}

struct BlockSpec {
    block_type: &'static str,
    labels: usize,
}

const fn attr(name: &'static str) -> AttrSpec {
    AttrSpec {
        name,
        required: false,
    }
}

const fn required(name: &'static str) -> AttrSpec {
    AttrSpec {
        name,
        required: true,
    }
}

const fn block(block_type: &'static str, labels: usize) -> BlockSpec {
    BlockSpec { block_type, labels }
}

static JOB: Schema = Schema {
    name: "job",
    attributes: &[
        attr("name"),
        attr("region"),
        attr("namespace"),
        attr("type"),
        attr("priority"),
        attr("all_at_once"),
        attr("datacenters"),
        attr("meta"),
    ],
    blocks: &[block("group", 1), block("constraint", 0), block("meta", 0)],
};

static GROUP: Schema = Schema {
    name: "group",
    attributes: &[attr("count"), attr("meta")],
    blocks: &[block("task", 1), block("constraint", 0), block("meta", 0)],
};

static TASK: Schema = Schema {
    name: "task",
    attributes: &[
        required("driver"),
        attr("user"),
        attr("leader"),
        attr("kill_timeout"),
        attr("config"),
        attr("env"),
        attr("meta"),
    ],
    blocks: &[
        block("config", 0),
        block("env", 0),
        block("meta", 0),
        block("constraint", 0),
        block("resources", 0),
    ],
};

static CONSTRAINT: Schema = Schema {
    name: "constraint",
    attributes: &[attr("attribute"), attr("operator"), attr("value")],
    blocks: &[],
};

static RESOURCES: Schema = Schema {
    name: "resources",
    attributes: &[attr("cpu"), attr("memory")],
    blocks: &[],
};

/// Decode an expanded document into a `Job`.
///
/// The document must hold exactly one `job` block; `variable` blocks were
/// already consumed while building the context and are skipped here.
pub fn decode(file: &str, body: &Body, ctx: &EvalContext) -> Result<Job, JobspecError> {
    let mut job_block: Option<&Block> = None;

    for item in &body.items {
        match item {
            BodyItem::Attribute(attr) => {
                return Err(JobspecError::decode(
                    file,
                    attr.line,
                    DecodeError::UnsupportedField {
                        block: "document".into(),
                        kind: "attribute",
                        name: attr.name.clone(),
                    },
                ));
            }
            BodyItem::Block(b) if b.block_type == VARIABLE => {}
            BodyItem::Block(b) if b.block_type == "job" && job_block.is_none() => job_block = Some(b),
            BodyItem::Block(b) => {
                return Err(JobspecError::decode(
                    file,
                    b.line,
                    DecodeError::UnsupportedField {
                        block: "document".into(),
                        kind: "block",
                        name: b.block_type.clone(),
                    },
                ));
            }
        }
    }

    let job_block = job_block.ok_or_else(|| {
        JobspecError::decode(
            file,
            1,
            DecodeError::MissingField {
                block: "document".into(),
                field: "job".into(),
            },
        )
    })?;

    let job = decode_job(&BodyDecoder::new(file, ctx, job_block, &JOB, 1)?)?;
    debug!(job = %job.id, groups = job.task_groups.len(), "decoded job");
    Ok(job)
}

fn decode_job(d: &BodyDecoder) -> Result<Job, JobspecError> {
    let id = d.label().to_string();

    let mut task_groups: Vec<TaskGroup> = Vec::new();
    let mut seen = HashSet::new();
    for block in d.blocks("group") {
        let group = decode_group(&d.nested(block, &GROUP)?)?;
        let name = group.name.clone().unwrap_or_default();
        if !seen.insert(name.clone()) {
            warn!(job = %id, group = %name, line = block.line, "duplicate task group dropped");
            continue;
        }
        task_groups.push(group);
    }

    Ok(Job {
        name: Some(d.attr::<String>("name")?.unwrap_or_else(|| id.clone())),
        region: d.attr("region")?,
        namespace: d.attr("namespace")?,
        job_type: d.attr("type")?,
        priority: d.attr("priority")?,
        all_at_once: d.attr("all_at_once")?,
        datacenters: d.attr("datacenters")?.unwrap_or_default(),
        constraints: decode_constraints(d)?,
        meta: d.string_map("meta")?,
        task_groups,
        id,
    })
}

fn decode_group(d: &BodyDecoder) -> Result<TaskGroup, JobspecError> {
    let name = d.label().to_string();

    let mut tasks: Vec<Task> = Vec::new();
    for block in d.blocks("task") {
        let task = decode_task(&d.nested(block, &TASK)?)?;
        if tasks.iter().any(|t| t.name == task.name) {
            warn!(group = %name, task = %task.name, line = block.line, "duplicate task dropped");
            continue;
        }
        tasks.push(task);
    }

    Ok(TaskGroup {
        count: d.attr("count")?,
        constraints: decode_constraints(d)?,
        meta: d.string_map("meta")?,
        tasks,
        name: Some(name),
    })
}

fn decode_task(d: &BodyDecoder) -> Result<Task, JobspecError> {
    let resources = match d.blocks("resources").first().copied() {
        Some(block) => {
            let r = d.nested(block, &RESOURCES)?;
            Some(Resources {
                cpu: r.attr("cpu")?,
                memory_mb: r.attr("memory")?,
            })
        }
        None => None,
    };

    Ok(Task {
        name: d.label().to_string(),
        driver: d.required("driver")?,
        user: d.attr("user")?,
        leader: d.attr("leader")?,
        kill_timeout: d.attr("kill_timeout")?,
        config: d.config()?,
        env: d.string_map("env")?,
        meta: d.string_map("meta")?,
        constraints: decode_constraints(d)?,
        resources,
    })
}

fn decode_constraints(d: &BodyDecoder) -> Result<Vec<Constraint>, JobspecError> {
    let mut out = Vec::new();
    for block in d.blocks("constraint") {
        let c = d.nested(block, &CONSTRAINT)?;
        out.push(Constraint {
            attribute: c.attr("attribute")?,
            operator: c.attr("operator")?,
            value: c.attr("value")?,
        });
    }
    Ok(out)
}

/// A block checked against its schema, with typed attribute accessors.
struct BodyDecoder<'a> {
    file: &'a str,
    ctx: &'a EvalContext<'a>,
    block: &'a Block,
    schema: &'static Schema,
    /// Human-readable location, e.g. `group "cache"`.
    context: String,
}

impl<'a> BodyDecoder<'a> {
    fn new(
        file: &'a str,
        ctx: &'a EvalContext<'a>,
        block: &'a Block,
        schema: &'static Schema,
        labels: usize,
    ) -> Result<Self, JobspecError> {
        if block.labels.len() != labels {
            return Err(JobspecError::decode(
                file,
                block.line,
                DecodeError::InvalidLabels {
                    block_type: block.block_type.clone(),
                    expected: labels,
                    found: block.labels.len(),
                },
            ));
        }

        let context = match block.labels.first() {
            Some(label) => format!("{} \"{}\"", schema.name, label),
            None => schema.name.to_string(),
        };
        let decoder = BodyDecoder {
            file,
            ctx,
            block,
            schema,
            context,
        };
        decoder.check_fields()?;
        Ok(decoder)
    }

    fn nested(&self, block: &'a Block, schema: &'static Schema) -> Result<Self, JobspecError> {
        let labels = self
            .schema
            .blocks
            .iter()
            .find(|b| b.block_type == block.block_type)
            .map_or(0, |b| b.labels);
        BodyDecoder::new(self.file, self.ctx, block, schema, labels)
    }

    /// Reject anything the schema does not name and require the required.
    fn check_fields(&self) -> Result<(), JobspecError> {
        for item in &self.block.body.items {
            let (known, kind, name, line) = match item {
                BodyItem::Attribute(a) => (
                    self.schema.attributes.iter().any(|s| s.name == a.name),
                    "attribute",
                    &a.name,
                    a.line,
                ),
                BodyItem::Block(b) => (
                    self.schema.blocks.iter().any(|s| s.block_type == b.block_type),
                    "block",
                    &b.block_type,
                    b.line,
                ),
            };
            if !known {
                return Err(self.error(
                    line,
                    DecodeError::UnsupportedField {
                        block: self.context.clone(),
                        kind,
                        name: name.clone(),
                    },
                ));
            }
        }

        for spec in self.schema.attributes.iter().filter(|s| s.required) {
            if self.block.body.attribute(spec.name).is_none() {
                return Err(self.missing(spec.name));
            }
        }
        Ok(())
    }

    fn label(&self) -> &'a str {
        self.block.labels.first().map_or("", String::as_str)
    }

    fn blocks(&self, block_type: &str) -> Vec<&'a Block> {
        let body: &'a Body = &self.block.body;
        body.blocks().filter(|b| b.block_type == block_type).collect()
    }

    fn error(&self, line: usize, e: DecodeError) -> JobspecError {
        JobspecError::decode(self.file, line, e)
    }

    fn missing(&self, field: &str) -> JobspecError {
        self.error(
            self.block.line,
            DecodeError::MissingField {
                block: self.context.clone(),
                field: field.to_string(),
            },
        )
    }

    fn evaluate(&self, attr: &Attribute) -> Result<Value, JobspecError> {
        self.ctx
            .evaluate_lenient(&attr.expr)
            .map_err(|e| JobspecError::eval(self.file, attr.line, e))
    }

    fn convert<T>(&self, attr: &Attribute, value: Value) -> Result<T, JobspecError>
    where
        T: TryFrom<Value, Error = DecodeError>,
    {
        T::try_from(value).map_err(|e| self.error(attr.line, e.for_field(&attr.name)))
    }

    /// Optional attribute; absent and null both decode to `None`.
    fn attr<T>(&self, name: &str) -> Result<Option<T>, JobspecError>
    where
        T: TryFrom<Value, Error = DecodeError>,
    {
        let Some(attr) = self.block.body.attribute(name) else {
            return Ok(None);
        };
        match self.evaluate(attr)? {
            Value::Null => Ok(None),
            value => self.convert(attr, value).map(Some),
        }
    }

    fn required<T>(&self, name: &str) -> Result<T, JobspecError>
    where
        T: TryFrom<Value, Error = DecodeError>,
    {
        self.attr(name)?.ok_or_else(|| self.missing(name))
    }

    /// String map given as an attribute (`meta = { ... }`) and/or any number
    /// of blocks (`meta { ... }`). Each value is evaluated on its own, so one
    /// unresolved reference does not affect its neighbours. The first
    /// occurrence of a key wins.
    fn string_map(&self, name: &str) -> Result<IndexMap<String, String>, JobspecError> {
        let mut out: IndexMap<String, String> = IndexMap::new();

        if let Some(map) = self.attr::<IndexMap<String, String>>(name)? {
            for (key, value) in map {
                out.entry(key).or_insert(value);
            }
        }

        for block in self.blocks(name) {
            if !block.labels.is_empty() {
                return Err(self.error(
                    block.line,
                    DecodeError::InvalidLabels {
                        block_type: block.block_type.clone(),
                        expected: 0,
                        found: block.labels.len(),
                    },
                ));
            }
            for item in &block.body.items {
                let attr = match item {
                    BodyItem::Attribute(attr) => attr,
                    BodyItem::Block(nested) => {
                        return Err(self.error(
                            nested.line,
                            DecodeError::UnsupportedField {
                                block: name.to_string(),
                                kind: "block",
                                name: nested.block_type.clone(),
                            },
                        ));
                    }
                };
                let value: String = self.convert(attr, self.evaluate(attr)?)?;
                out.entry(attr.name.clone()).or_insert(value);
            }
        }

        Ok(out)
    }

    /// Free-form driver configuration. Nested blocks collect into a list of
    /// maps keyed by their block type.
    fn config(&self) -> Result<IndexMap<String, Value>, JobspecError> {
        let mut out = IndexMap::new();

        if let Some(attr) = self.block.body.attribute("config") {
            match self.evaluate(attr)? {
                Value::Map(entries) => out.extend(entries),
                Value::Null => {}
                other => {
                    return Err(self.error(
                        attr.line,
                        DecodeError::TypeMismatch {
                            field: "config".into(),
                            expected: "map",
                            found: other.type_name(),
                        },
                    ));
                }
            }
        }

        for block in self.blocks("config") {
            for (key, value) in self.free_form(&block.body)? {
                out.entry(key).or_insert(value);
            }
        }
        Ok(out)
    }

    fn free_form(&self, body: &Body) -> Result<IndexMap<String, Value>, JobspecError> {
        let mut out = IndexMap::new();
        for item in &body.items {
            match item {
                BodyItem::Attribute(attr) => {
                    out.insert(attr.name.clone(), self.evaluate(attr)?);
                }
                BodyItem::Block(nested) => {
                    let value = Value::Map(self.free_form(&nested.body)?);
                    let slot = out
                        .entry(nested.block_type.clone())
                        .or_insert_with(|| Value::List(Vec::new()));
                    match slot {
                        Value::List(items) => items.push(value),
                        _ => {
                            return Err(self.error(
                                nested.line,
                                DecodeError::UnsupportedField {
                                    block: "config".into(),
                                    kind: "block",
                                    name: nested.block_type.clone(),
                                },
                            ));
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}
