/// One step of a line-level edit script between an original and a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Line present unchanged in both sequences.
    Kept { original: usize, candidate: usize },
    /// Line only in the original.
    Removed { original: usize },
    /// Line only in the candidate.
    Added { candidate: usize },
}

/// Compute an LCS-based edit script that walks both sequences in order.
///
/// Repeated lines are matched against their earliest possible copy in the
/// original, so a partial candidate never lays claim to original lines it has
/// not reached yet. The shared prefix is matched directly and only the rest
/// goes through the quadratic table.
pub fn edit_script<A, B>(original: &[A], candidate: &[B]) -> Vec<EditOp>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let mut prefix = 0usize;
    while prefix < original.len()
        && prefix < candidate.len()
        && original[prefix].as_ref() == candidate[prefix].as_ref()
    {
        prefix += 1;
    }

    let mut out = Vec::with_capacity(original.len() + candidate.len());
    out.extend((0..prefix).map(|index| EditOp::Kept {
        original: index,
        candidate: index,
    }));

    let old_lines: Vec<&str> = original[prefix..].iter().map(AsRef::as_ref).collect();
    let new_lines: Vec<&str> = candidate[prefix..].iter().map(AsRef::as_ref).collect();
    out.extend(
        build_middle_script(&old_lines, &new_lines)
            .into_iter()
            .map(|op| offset_op(op, prefix)),
    );
    out
}

/// Count how many leading original lines the candidate has confirmed so far.
///
/// Walks the edit script and remembers the 1-based original position of the
/// last kept line. Removed lines advance the position without being trusted,
/// since the candidate may simply not have reached them yet. Returns `None`
/// when nothing in the candidate lines up with the original.
pub fn find_last_non_deleted<A, B>(original: &[A], candidate: &[B]) -> Option<usize>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    if candidate.is_empty() {
        return None;
    }
    if original.is_empty() {
        return Some(0);
    }

    let mut num_orig = 0usize;
    let mut last_non_deleted = None;
    for op in edit_script(original, candidate) {
        match op {
            EditOp::Kept { .. } => {
                num_orig += 1;
                last_non_deleted = Some(num_orig);
            }
            EditOp::Removed { .. } => num_orig += 1,
            EditOp::Added { .. } => {}
        }
    }
    last_non_deleted
}

fn offset_op(op: EditOp, by: usize) -> EditOp {
    match op {
        EditOp::Kept {
            original,
            candidate,
        } => EditOp::Kept {
            original: original + by,
            candidate: candidate + by,
        },
        EditOp::Removed { original } => EditOp::Removed {
            original: original + by,
        },
        EditOp::Added { candidate } => EditOp::Added {
            candidate: candidate + by,
        },
    }
}

fn build_middle_script(old_lines: &[&str], new_lines: &[&str]) -> Vec<EditOp> {
    let lcs = LcsTable::build(old_lines, new_lines);
    let mut out = Vec::with_capacity(old_lines.len() + new_lines.len());

    let mut old_index = 0usize;
    let mut new_index = 0usize;

    while old_index < old_lines.len() && new_index < new_lines.len() {
        if old_lines[old_index] == new_lines[new_index] {
            out.push(EditOp::Kept {
                original: old_index,
                candidate: new_index,
            });
            old_index += 1;
            new_index += 1;
        } else if lcs.get(old_index + 1, new_index) > lcs.get(old_index, new_index + 1) {
            // Ties skip the candidate line so later original copies stay unclaimed.
            out.push(EditOp::Removed {
                original: old_index,
            });
            old_index += 1;
        } else {
            out.push(EditOp::Added {
                candidate: new_index,
            });
            new_index += 1;
        }
    }

    out.extend((old_index..old_lines.len()).map(|original| EditOp::Removed { original }));
    out.extend((new_index..new_lines.len()).map(|candidate| EditOp::Added { candidate }));
    out
}

/// Suffix LCS lengths, `(old.len() + 1) x (new.len() + 1)`, stored row-major.
struct LcsTable {
    width: usize,
    cells: Vec<usize>,
}

impl LcsTable {
    fn build(old_lines: &[&str], new_lines: &[&str]) -> Self {
        let width = new_lines.len() + 1;
        let mut table = Self {
            width,
            cells: vec![0usize; (old_lines.len() + 1) * width],
        };

        for old_index in (0..old_lines.len()).rev() {
            for new_index in (0..new_lines.len()).rev() {
                let value = if old_lines[old_index] == new_lines[new_index] {
                    table.get(old_index + 1, new_index + 1) + 1
                } else {
                    table
                        .get(old_index + 1, new_index)
                        .max(table.get(old_index, new_index + 1))
                };
                table.cells[old_index * width + new_index] = value;
            }
        }

        table
    }

    fn get(&self, old_index: usize, new_index: usize) -> usize {
        self.cells[old_index * self.width + new_index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(ops: &[EditOp]) -> String {
        ops.iter()
            .map(|op| match op {
                EditOp::Kept { .. } => ' ',
                EditOp::Removed { .. } => '-',
                EditOp::Added { .. } => '+',
            })
            .collect()
    }

    #[test]
    fn test_edit_script_classifies_lines() {
        let original = ["a\n", "b\n", "c\n", "d\n"];
        let candidate = ["a\n", "x\n", "c\n", "d\n", "e\n"];
        let ops = edit_script(&original, &candidate);
        assert_eq!(kinds(&ops), " +-  +");
        assert_eq!(
            ops[1],
            EditOp::Added { candidate: 1 },
            "middle ops must be offset by the shared prefix"
        );
        assert_eq!(
            ops[4],
            EditOp::Kept {
                original: 3,
                candidate: 3
            }
        );
    }

    #[test]
    fn test_edit_script_handles_empty_sides() {
        let empty: [&str; 0] = [];
        assert_eq!(kinds(&edit_script(&empty, &["a\n"])), "+");
        assert_eq!(kinds(&edit_script(&["a\n"], &empty)), "-");
        assert!(edit_script(&empty, &empty).is_empty());
    }

    #[test]
    fn test_edit_script_gap_before_shared_tail() {
        let ops = edit_script(&["a\n", "z\n"], &["b\n", "z\n"]);
        assert_eq!(kinds(&ops), "+- ");
        assert_eq!(
            ops[2],
            EditOp::Kept {
                original: 1,
                candidate: 1
            }
        );
    }

    #[test]
    fn test_find_last_non_deleted_partial_prefix() {
        let original = ["a\n", "b\n", "c\n"];
        assert_eq!(find_last_non_deleted(&original, &["a\n", "b\n"]), Some(2));
    }

    #[test]
    fn test_find_last_non_deleted_ignores_unmatched_tail() {
        let original = ["a\n", "b\n", "c\n", "d\n"];
        let candidate = ["a\n", "B\n", "c\n", "new\n"];
        assert_eq!(find_last_non_deleted(&original, &candidate), Some(3));
    }

    #[test]
    fn test_find_last_non_deleted_empty_candidate_is_none() {
        let empty: [&str; 0] = [];
        assert_eq!(find_last_non_deleted(&["a\n"], &empty), None);
        assert_eq!(find_last_non_deleted(&empty, &empty), None);
    }

    #[test]
    fn test_find_last_non_deleted_no_match_is_none() {
        assert_eq!(find_last_non_deleted(&["a\n", "b\n"], &["x\n"]), None);
    }

    #[test]
    fn test_repeated_lines_match_earliest_copy() {
        let original = ["x\n", "b\n", "c\n", "b\n", "d\n"];
        assert_eq!(find_last_non_deleted(&original, &["y\n", "b\n"]), Some(2));
    }

    #[test]
    fn test_closing_brace_does_not_claim_later_function() {
        let original = [
            "fn a() {\n",
            "    x();\n",
            "}\n",
            "\n",
            "fn b() {\n",
            "    y();\n",
            "}\n",
        ];
        let candidate = ["fn a() {\n", "    X();\n", "}\n"];
        assert_eq!(find_last_non_deleted(&original, &candidate), Some(3));

        let mut rewrite = candidate.to_vec();
        rewrite.extend_from_slice(&original[3..]);
        let confirmed: Vec<usize> = (1..=rewrite.len())
            .map(|end| find_last_non_deleted(&original, &rewrite[..end]).unwrap_or(0))
            .collect();
        assert_eq!(confirmed, vec![1, 1, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_find_last_non_deleted_empty_original_is_zero() {
        let empty: [&str; 0] = [];
        assert_eq!(find_last_non_deleted(&empty, &["new\n"]), Some(0));
    }
}
