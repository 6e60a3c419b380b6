//! # isomir-rust
//!
//! 小 RNA 测序 tag 的 isomiR 分类与扩展前体比对。
//!
//! 本 crate 提供：
//!
//! - **变体分类**：由 canonical 序列、tag 序列与比对起点计算 5' / 3' 差值、SNP 数，给出 12 类类型标签与显示名称
//! - **扩展前体**：按数据集最大 5' / 3' 延伸从基因组截取窗口，canonical 区段小写
//! - **前体比对**：把 tag 放入窗口，逐位置给出碱基及其是否与基因组模板一致
//! - **位置统计**：延伸位置的碱基频率、模板/非模板计数，以及按 extended / truncated 分组的全位置概况
//!
//! ## 快速示例
//!
//! ```rust
//! use isomir_rust::align::align_tag;
//! use isomir_rust::classify::{classify, VariantType};
//! use isomir_rust::precursor::{DatasetWindow, ExtendedPrecursor};
//!
//! let canonical = b"UGAGGUAGUAGGUUGUAUAGUU";
//! let tag = b"AUGAGGUAGUAGGUUGUAUAGUU";
//! let c = classify("let-7a-5p", canonical, tag, 0, 1, -1);
//! assert_eq!(c.variant_type, VariantType::Iso5pOnly);
//! assert_eq!(c.display_name, "let-7a-5p(5'+1)");
//!
//! let window = DatasetWindow::new(2, 2);
//! let pre = ExtendedPrecursor::from_window_sequence("let-7a-5p", b"GAUGAGGUAGUAGGUUGUAUAGUUUU", window).unwrap();
//! let aln = align_tag(&pre, window, tag, c.nt_diff_5p, c.nt_diff_3p).unwrap();
//! assert_eq!(aln.rows[0].to_string(), "(' ', ' ')");
//! assert_eq!(aln.rows[1].to_string(), "(a, +)");
//! ```
//!
//! ## 模块说明
//!
//! - [`classify`] — 5' / 3' / SNP 变体分类与命名
//! - [`align`] — 扩展前体中的放置、逐位置匹配、延伸位置统计
//! - [`precursor`] — 数据集窗口、基因组位点、扩展前体集合及其持久化
//! - [`io`] — FASTA / GFF3 / isomiR-SEA 输入与 CSV 输出
//! - [`record`] — isomiR-SEA 行记录与分类结果记录
//! - [`pipeline`] — classify / precursor / align 三个阶段
//! - [`util`] — 碱基比较、反向互补等工具函数
//! - [`error`] — 错误类型

pub mod align;
pub mod classify;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod precursor;
pub mod record;
pub mod util;
