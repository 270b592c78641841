//! RV32 assembly formatting.
//!
//! A thin formatter over a line buffer: instructions, directives, labels
//! and data words. No validation and no optimization happens here; every
//! method formats exactly one line (plus an optional trailing comment)
//! in the order called.

use std::fmt;

use super::label::Label;

/// An RV32 register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    S8,
    S9,
    S10,
    S11,
    Fp,
    Sp,
    Gp,
    Ra,
    Zero,
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg::A0 => "a0",
            Reg::A1 => "a1",
            Reg::A2 => "a2",
            Reg::A3 => "a3",
            Reg::A4 => "a4",
            Reg::A5 => "a5",
            Reg::A6 => "a6",
            Reg::A7 => "a7",
            Reg::T0 => "t0",
            Reg::T1 => "t1",
            Reg::T2 => "t2",
            Reg::T3 => "t3",
            Reg::T4 => "t4",
            Reg::T5 => "t5",
            Reg::T6 => "t6",
            Reg::S1 => "s1",
            Reg::S2 => "s2",
            Reg::S3 => "s3",
            Reg::S4 => "s4",
            Reg::S5 => "s5",
            Reg::S6 => "s6",
            Reg::S7 => "s7",
            Reg::S8 => "s8",
            Reg::S9 => "s9",
            Reg::S10 => "s10",
            Reg::S11 => "s11",
            Reg::Fp => "fp",
            Reg::Sp => "sp",
            Reg::Gp => "gp",
            Reg::Ra => "ra",
            Reg::Zero => "zero",
        };
        f.write_str(name)
    }
}

/// The assembly sink. Owns the output buffer; `finish` yields the text.
pub struct RiscvBackend {
    lines: Vec<String>,
    word_size: i32,
}

impl Default for RiscvBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RiscvBackend {
    pub fn new() -> Self {
        Self::with_word_size(4)
    }

    pub fn with_word_size(word_size: i32) -> Self {
        assert!(
            word_size > 0 && word_size.count_ones() == 1,
            "word size must be a positive power of two"
        );
        Self {
            lines: Vec::new(),
            word_size,
        }
    }

    pub fn word_size(&self) -> i32 {
        self.word_size
    }

    /// log2 of the word size, the power used for object alignment.
    pub fn word_align(&self) -> u32 {
        self.word_size.trailing_zeros()
    }

    pub fn finish(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn emit(&mut self, line: String) {
        self.lines.push(line);
    }

    /// An instruction or directive, two-space indented, with the comment
    /// (if any) starting at column 40.
    fn insn(&mut self, insn: String, comment: &str) {
        if comment.is_empty() {
            self.emit(format!("  {}", insn));
        } else {
            self.emit(format!("  {:<40} # {}", insn, comment));
        }
    }

    // ── Sections, labels, data ────────────────────────────────────

    pub fn start_data(&mut self) {
        self.emit(String::new());
        self.emit(".data".to_string());
    }

    pub fn start_code(&mut self) {
        self.emit(String::new());
        self.emit(".text".to_string());
    }

    /// Declare LABEL globally and mark its position. Invoke only once
    /// per unique label.
    pub fn global_label(&mut self, label: &Label) {
        self.emit(String::new());
        self.emit(format!(".globl {}", label));
        self.emit(format!("{}:", label));
    }

    /// Mark the position of a compiler-local label.
    pub fn local_label(&mut self, label: &Label, comment: &str) {
        self.insn(format!("{}:", label), comment);
    }

    pub fn word_literal(&mut self, value: i32, comment: &str) {
        self.insn(format!(".word {}", value), comment);
    }

    /// A data word holding an address; a missing label is the null word.
    pub fn word_address(&mut self, addr: Option<&Label>, comment: &str) {
        match addr {
            Some(label) => self.insn(format!(".word {}", label), comment),
            None => self.word_literal(0, comment),
        }
    }

    /// A null-terminated string with standard escape rewriting.
    pub fn string_literal(&mut self, value: &str, comment: &str) {
        let quoted = value
            .replace('\\', "\\\\")
            .replace('\n', "\\n")
            .replace('\t', "\\t")
            .replace('"', "\\\"");
        self.insn(format!(".string \"{}\"", quoted), comment);
    }

    /// Align the next emission to 2^pow bytes.
    pub fn align(&mut self, pow: u32) {
        self.insn(format!(".align {}", pow), "");
    }

    // ── Instructions ──────────────────────────────────────────────

    pub fn ecall(&mut self, comment: &str) {
        self.insn("ecall".to_string(), comment);
    }

    pub fn li(&mut self, rd: Reg, imm: i32, comment: &str) {
        self.insn(format!("li {}, {}", rd, imm), comment);
    }

    pub fn lui(&mut self, rd: Reg, imm: i32, comment: &str) {
        self.insn(format!("lui {}, {}", rd, imm), comment);
    }

    pub fn la(&mut self, rd: Reg, label: &Label, comment: &str) {
        self.insn(format!("la {}, {}", rd, label), comment);
    }

    pub fn mv(&mut self, rd: Reg, rs: Reg, comment: &str) {
        self.insn(format!("mv {}, {}", rd, rs), comment);
    }

    pub fn add(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("add {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn addi(&mut self, rd: Reg, rs: Reg, imm: i32, comment: &str) {
        self.insn(format!("addi {}, {}, {}", rd, rs, imm), comment);
    }

    pub fn sub(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("sub {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn mul(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("mul {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn div(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("div {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn rem(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("rem {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn and(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("and {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn andi(&mut self, rd: Reg, rs: Reg, imm: i32, comment: &str) {
        self.insn(format!("andi {}, {}, {}", rd, rs, imm), comment);
    }

    pub fn or(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("or {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn ori(&mut self, rd: Reg, rs: Reg, imm: i32, comment: &str) {
        self.insn(format!("ori {}, {}, {}", rd, rs, imm), comment);
    }

    pub fn xor(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("xor {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn xori(&mut self, rd: Reg, rs: Reg, imm: i32, comment: &str) {
        self.insn(format!("xori {}, {}, {}", rd, rs, imm), comment);
    }

    pub fn lw(&mut self, rd: Reg, rs: Reg, imm: i32, comment: &str) {
        self.insn(format!("lw {}, {}({})", rd, imm, rs), comment);
    }

    pub fn sw(&mut self, rs2: Reg, rs1: Reg, imm: i32, comment: &str) {
        self.insn(format!("sw {}, {}({})", rs2, imm, rs1), comment);
    }

    /// Load a word from a global cell.
    pub fn lw_global(&mut self, rd: Reg, label: &Label, comment: &str) {
        self.insn(format!("lw {}, {}", rd, label), comment);
    }

    /// Store a word to a global cell, using TMP for the address.
    pub fn sw_global(&mut self, rs: Reg, label: &Label, tmp: Reg, comment: &str) {
        self.insn(format!("sw {}, {}, {}", rs, label, tmp), comment);
    }

    pub fn lb(&mut self, rd: Reg, rs: Reg, imm: i32, comment: &str) {
        self.insn(format!("lb {}, {}({})", rd, imm, rs), comment);
    }

    pub fn lbu(&mut self, rd: Reg, rs: Reg, imm: i32, comment: &str) {
        self.insn(format!("lbu {}, {}({})", rd, imm, rs), comment);
    }

    pub fn sb(&mut self, rs2: Reg, rs1: Reg, imm: i32, comment: &str) {
        self.insn(format!("sb {}, {}({})", rs2, imm, rs1), comment);
    }

    pub fn j(&mut self, label: &Label, comment: &str) {
        self.insn(format!("j {}", label), comment);
    }

    pub fn jr(&mut self, rs: Reg, comment: &str) {
        self.insn(format!("jr {}", rs), comment);
    }

    pub fn jal(&mut self, label: &Label, comment: &str) {
        self.insn(format!("jal {}", label), comment);
    }

    pub fn jalr(&mut self, rs: Reg, comment: &str) {
        self.insn(format!("jalr {}", rs), comment);
    }

    pub fn beq(&mut self, rs1: Reg, rs2: Reg, label: &Label, comment: &str) {
        self.insn(format!("beq {}, {}, {}", rs1, rs2, label), comment);
    }

    pub fn bne(&mut self, rs1: Reg, rs2: Reg, label: &Label, comment: &str) {
        self.insn(format!("bne {}, {}, {}", rs1, rs2, label), comment);
    }

    pub fn bgeu(&mut self, rs1: Reg, rs2: Reg, label: &Label, comment: &str) {
        self.insn(format!("bgeu {}, {}, {}", rs1, rs2, label), comment);
    }

    pub fn beqz(&mut self, rs: Reg, label: &Label, comment: &str) {
        self.insn(format!("beqz {}, {}", rs, label), comment);
    }

    pub fn bnez(&mut self, rs: Reg, label: &Label, comment: &str) {
        self.insn(format!("bnez {}, {}", rs, label), comment);
    }

    pub fn bltz(&mut self, rs: Reg, label: &Label, comment: &str) {
        self.insn(format!("bltz {}, {}", rs, label), comment);
    }

    pub fn bgtz(&mut self, rs: Reg, label: &Label, comment: &str) {
        self.insn(format!("bgtz {}, {}", rs, label), comment);
    }

    pub fn blez(&mut self, rs: Reg, label: &Label, comment: &str) {
        self.insn(format!("blez {}, {}", rs, label), comment);
    }

    pub fn bgez(&mut self, rs: Reg, label: &Label, comment: &str) {
        self.insn(format!("bgez {}, {}", rs, label), comment);
    }

    pub fn slt(&mut self, rd: Reg, rs1: Reg, rs2: Reg, comment: &str) {
        self.insn(format!("slt {}, {}, {}", rd, rs1, rs2), comment);
    }

    pub fn seqz(&mut self, rd: Reg, rs: Reg, comment: &str) {
        self.insn(format!("seqz {}, {}", rd, rs), comment);
    }

    pub fn snez(&mut self, rd: Reg, rs: Reg, comment: &str) {
        self.insn(format!("snez {}, {}", rd, rs), comment);
    }
}
