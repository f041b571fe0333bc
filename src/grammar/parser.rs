//! The pest-generated parser over [`Rule`], driven from `jcl.pest`.

use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "grammar/jcl.pest"]
pub struct JclParser;
