//! Known VM opcode names.

use std::collections::HashSet;

const PARROT_OPCODES: &[&str] = &[
    // control flow
    "noop", "end", "branch", "jump", "bsr", "ret", "local_branch", "local_return", "if",
    "unless", "if_null", "unless_null", "eq", "ne", "lt", "le", "gt", "ge", "eq_str", "ne_str",
    "eq_num", "ne_num", "eq_addr", "ne_addr", "set_addr", "get_addr", "exit", "die", "throw",
    "rethrow", "push_eh", "pop_eh", "clear_eh", "count_eh", "returncc", "yield", "tailcall",
    "invoke", "invokecc", "callmethod", "callmethodcc", "tailcallmethod",
    // calling convention
    "set_args", "get_params", "set_returns", "get_results", "result_info",
    // data movement
    "set", "assign", "setref", "deref", "null", "clone", "copy", "exchange", "box", "unbox",
    // arithmetic
    "add", "sub", "mul", "div", "fdiv", "mod", "cmod", "pow", "inc", "dec", "neg", "abs",
    "sqrt", "exp", "ln", "log2", "log10", "sin", "cos", "tan", "asin", "acos", "atan", "sinh",
    "cosh", "tanh", "floor", "ceil", "gcd", "lcm", "fact",
    // bitwise and logical
    "band", "bor", "bxor", "bnot", "shl", "shr", "lsr", "rot", "and", "or", "xor", "not",
    // comparison
    "cmp", "cmp_str", "cmp_num", "cmp_pmc", "iseq", "isne", "islt", "isle", "isgt", "isge",
    "isnull", "issame", "isntsame", "istrue", "isfalse",
    // strings
    "concat", "repeat", "length", "bytelength", "substr", "replace", "index", "join", "split",
    "chr", "ord", "upcase", "downcase", "titlecase", "sprintf", "chopn", "trans_charset",
    "trans_encoding", "escape", "compose", "find_charset", "find_encoding", "charset",
    "charsetname", "encoding", "encodingname", "is_cclass", "find_cclass", "find_not_cclass",
    "stringinfo",
    // objects and containers
    "new", "newclass", "subclass", "get_class", "class", "typeof", "isa", "does", "can",
    "find_method", "addattribute", "getattribute", "setattribute", "removeattribute",
    "addparent", "removeparent", "addrole", "inspect", "defined", "exists", "delete",
    "elements", "push", "pop", "shift", "unshift", "splice", "iter", "morph", "get_repr",
    "newclosure", "get_id", "setprop", "getprop", "delprop", "prophash", "freeze", "thaw",
    // namespaces and globals
    "get_global", "set_global", "get_hll_global", "set_hll_global", "get_root_global",
    "set_root_global", "get_namespace", "get_hll_namespace", "get_root_namespace",
    "find_lex", "store_lex", "find_dynamic_lex", "find_caller_lex", "find_name",
    "find_sub_not_null",
    // I/O
    "print", "say", "printerr", "open", "close", "read", "readline", "peek", "seek", "tell",
    "getstdin", "getstdout", "getstderr", "setstdout", "setstderr", "stat", "socket",
    // interpreter
    "load_bytecode", "load_language", "loadlib", "dlfunc", "dlvar", "compreg", "interpinfo",
    "trace", "debug", "bounds", "profile", "sweep", "collect", "sweepoff", "sweepon",
    "collectoff", "collecton", "needs_destroy", "time", "sleep", "err", "errorsoff",
    "errorson", "annotations", "setfile", "setline", "getfile", "getline", "backtrace",
    "schedule", "addhandler", "finalize", "spawnw", "sysinfo", "gmtime", "localtime",
    "decodetime", "decodelocaltime",
];

/// Set of identifiers that name VM opcodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpcodeTable {
    names: HashSet<String>,
}

impl OpcodeTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding the core Parrot opcodes.
    pub fn parrot() -> Self {
        let mut table = Self::new();
        table.extend(PARROT_OPCODES.iter().copied());
        table
    }

    /// Adds opcode names.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names.extend(names.into_iter().map(Into::into));
    }

    /// Returns `true` when `name` is an opcode.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
