//! Table commands.
//!
//! Structural edits work against a grid map of the table rather than the
//! node tree directly. A spanning cell occupies several grid slots but is
//! owned by a single node, so each slot records the owner's (row, cell)
//! child indexes:
//!
//! ```text
//!   +-------+---+        (0,0) (0,0) (0,1)
//!   |   A   | B |   =>   (1,0) (1,1) (0,1)
//!   +---+---+   |
//!   | C | D |   |
//!   +---+---+---+
//! ```
//!
//! Every command rebuilds the whole table node and swaps it in with a
//! single step, then trial-applies the result. An edit that would leave a
//! row without cells is reported as not applicable.

use std::collections::{HashMap, HashSet};

use vellum_model::{
    EditorState, Node, NodeType, ResolvedPos, Schema, Selection, Step, Transaction,
};

use crate::utils::{empty_cell, validated};

/// Grid view of a table. `grid[r][c]` holds the (row child, cell child)
/// indexes of the node covering that slot, or `None` where a ragged table
/// leaves a hole.
struct TableMap {
    rows: usize,
    cols: usize,
    grid: Vec<Vec<Option<(usize, usize)>>>,
    /// Leftmost grid column of each cell child.
    lefts: HashMap<(usize, usize), usize>,
}

impl TableMap {
    fn build(schema: &Schema, table: &Node) -> TableMap {
        let mut grid: Vec<Vec<Option<(usize, usize)>>> = Vec::new();
        let mut lefts = HashMap::new();
        for (r, row) in table.children().iter().enumerate() {
            if grid.len() <= r {
                grid.push(Vec::new());
            }
            for (c, cell) in row.children().iter().enumerate() {
                let colspan = span(schema, cell, "colspan") as usize;
                let rowspan = span(schema, cell, "rowspan") as usize;
                let mut col = 0;
                while col < grid[r].len() && grid[r][col].is_some() {
                    col += 1;
                }
                lefts.insert((r, c), col);
                for dr in 0..rowspan {
                    while grid.len() <= r + dr {
                        grid.push(Vec::new());
                    }
                    let slots = &mut grid[r + dr];
                    if slots.len() < col + colspan {
                        slots.resize(col + colspan, None);
                    }
                    for dc in 0..colspan {
                        slots[col + dc] = Some((r, c));
                    }
                }
            }
        }
        // rowspan overhang past the last row is clamped to the table
        grid.truncate(table.child_count());
        let cols = grid.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut grid {
            row.resize(cols, None);
        }
        TableMap {
            rows: grid.len(),
            cols,
            grid,
            lefts,
        }
    }

    fn owner_at(&self, r: usize, c: usize) -> Option<(usize, usize)> {
        self.grid.get(r).and_then(|row| row.get(c)).copied().flatten()
    }
}

fn span(schema: &Schema, cell: &Node, name: &str) -> i64 {
    schema.attr_int(cell, name).unwrap_or(1).max(1)
}

/// Grid-coordinate rectangle, half-open on both axes.
#[derive(Debug, Clone, Copy)]
struct Rect {
    top: usize,
    left: usize,
    bottom: usize,
    right: usize,
}

/// The table containing a position, with the row and cell child indexes
/// the position falls in (or points at, for a position directly before a
/// cell).
struct CellCtx<'a> {
    table: &'a Node,
    table_pos: usize,
    row_index: usize,
    cell_index: usize,
}

fn selected_cell(state: &EditorState, pos: usize) -> Option<CellCtx<'_>> {
    let r = ResolvedPos::resolve(&state.doc, pos)?;
    let (table, table_depth) = r.ancestor_of_type(NodeType::Table)?;
    if r.depth() < table_depth + 1 {
        // between rows, not in a cell
        return None;
    }
    Some(CellCtx {
        table,
        table_pos: r.before(table_depth)?,
        row_index: r.index(table_depth),
        cell_index: r.index(table_depth + 1),
    })
}

/// Position directly before the cell at (row, cell) child indexes.
fn cell_start(table: &Node, table_pos: usize, row: usize, cell: usize) -> Option<usize> {
    let mut pos = table_pos + 1;
    for i in 0..row {
        pos += table.child(i)?.node_size();
    }
    pos += 1;
    let row_node = table.child(row)?;
    for i in 0..cell {
        pos += row_node.child(i)?.node_size();
    }
    Some(pos)
}

/// Grid extent of a cell child: (top, left, bottom, right), half-open.
fn cell_extent(
    schema: &Schema,
    table: &Node,
    map: &TableMap,
    at: (usize, usize),
) -> Option<Rect> {
    let cell = table.child(at.0)?.child(at.1)?;
    let left = *map.lefts.get(&at)?;
    Some(Rect {
        top: at.0,
        left,
        bottom: at.0 + span(schema, cell, "rowspan") as usize,
        right: left + span(schema, cell, "colspan") as usize,
    })
}

/// Owners of every slot in `rect`, deduplicated, in document order.
/// `None` when the rectangle crosses a hole in a ragged table.
fn owners_in(map: &TableMap, rect: Rect) -> Option<Vec<(usize, usize)>> {
    let mut owners = Vec::new();
    for r in rect.top..rect.bottom {
        for c in rect.left..rect.right {
            let owner = map.owner_at(r, c)?;
            if !owners.contains(&owner) {
                owners.push(owner);
            }
        }
    }
    Some(owners)
}

fn rebuild_row(cells: Vec<Node>) -> Node {
    Node::element(NodeType::TableRow).with_children(cells)
}

fn swap_table(state: &EditorState, table_pos: usize, rows: Vec<Node>) -> Option<Transaction> {
    let table = Node::element(NodeType::Table).with_children(rows);
    let tr = Transaction::new().step(Step::ReplaceNode {
        pos: table_pos,
        node: table,
    });
    validated(state, tr)
}

/// Inserts a fresh 3x3 table at the selection. Selected content is
/// removed first; the table lands after the top-level block that held the
/// selection, with the caret in its first cell.
pub fn insert_table(state: &EditorState) -> Option<Transaction> {
    let sel = &state.selection;
    let mut tr = Transaction::new();
    let mut work = state.clone();
    if sel.start() != sel.end() {
        let collapse = Step::ReplaceRange {
            from: sel.start(),
            to: sel.end(),
            content: Vec::new(),
        };
        work.apply(&Transaction::new().step(collapse.clone())).ok()?;
        tr.steps.push(collapse);
    }
    let r = ResolvedPos::resolve(&work.doc, sel.start())?;
    let pos = if r.depth() == 0 {
        r.pos()
    } else {
        r.after(1)?
    };
    let rows = (0..3)
        .map(|_| rebuild_row((0..3).map(|_| empty_cell()).collect()))
        .collect();
    let table = Node::element(NodeType::Table).with_children(rows);
    let tr = tr
        .step(Step::ReplaceRange {
            from: pos,
            to: pos,
            content: vec![table],
        })
        .with_selection(Selection::caret(pos + 4));
    validated(state, tr)
}

/// Adds a row below the selected cell. Cells spanning across the new
/// row's position grow by one instead of being duplicated.
pub fn add_row_after(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let map = TableMap::build(&state.schema, ctx.table);
    let extent = cell_extent(&state.schema, ctx.table, &map, (ctx.row_index, ctx.cell_index))?;
    insert_row_at(state, &ctx, &map, extent.bottom.min(map.rows))
}

/// Adds a row above the selected cell.
pub fn add_row_before(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let map = TableMap::build(&state.schema, ctx.table);
    insert_row_at(state, &ctx, &map, ctx.row_index)
}

/// Inserts a row at the boundary above grid row `at` (`at == rows`
/// appends). Cells spanning the boundary grow by one instead of being
/// duplicated.
fn insert_row_at(
    state: &EditorState,
    ctx: &CellCtx<'_>,
    map: &TableMap,
    at: usize,
) -> Option<Transaction> {
    let schema = &state.schema;
    let mut grow: HashSet<(usize, usize)> = HashSet::new();
    let mut fresh: Vec<Node> = Vec::new();
    for c in 0..map.cols {
        let above = if at > 0 { map.owner_at(at - 1, c) } else { None };
        let below = if at < map.rows { map.owner_at(at, c) } else { None };
        match (above, below) {
            (Some(a), Some(b)) if a == b => {
                grow.insert(a);
            }
            _ => fresh.push(empty_cell()),
        }
    }

    let mut rows: Vec<Node> = Vec::new();
    for (r, row) in ctx.table.children().iter().enumerate() {
        if r == at {
            rows.push(rebuild_row(fresh.clone()));
        }
        let cells = row
            .children()
            .iter()
            .enumerate()
            .map(|(ci, cell)| {
                if grow.contains(&(r, ci)) {
                    let rs = span(schema, cell, "rowspan");
                    cell.clone().with_attr("rowspan", rs + 1)
                } else {
                    cell.clone()
                }
            })
            .collect();
        rows.push(rebuild_row(cells));
    }
    if at >= ctx.table.child_count() {
        rows.push(rebuild_row(fresh));
    }
    swap_table(state, ctx.table_pos, rows)
}

/// Adds a column to the right of the selected cell. Cells spanning across
/// the new column's position grow by one instead of being duplicated.
pub fn add_column_after(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let map = TableMap::build(&state.schema, ctx.table);
    let extent = cell_extent(&state.schema, ctx.table, &map, (ctx.row_index, ctx.cell_index))?;
    insert_column_at(state, &ctx, &map, extent.right.min(map.cols))
}

/// Adds a column to the left of the selected cell.
pub fn add_column_before(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let map = TableMap::build(&state.schema, ctx.table);
    let left = *map.lefts.get(&(ctx.row_index, ctx.cell_index))?;
    insert_column_at(state, &ctx, &map, left)
}

/// Inserts a column at the boundary left of grid column `at` (`at ==
/// cols` appends).
fn insert_column_at(
    state: &EditorState,
    ctx: &CellCtx<'_>,
    map: &TableMap,
    at: usize,
) -> Option<Transaction> {
    let schema = &state.schema;
    let mut grow: HashSet<(usize, usize)> = HashSet::new();
    let mut needs_cell: Vec<usize> = Vec::new();
    for r in 0..map.rows {
        let before = if at > 0 { map.owner_at(r, at - 1) } else { None };
        let after = if at < map.cols { map.owner_at(r, at) } else { None };
        match (before, after) {
            (Some(a), Some(b)) if a == b => {
                grow.insert(a);
            }
            _ => needs_cell.push(r),
        }
    }

    let mut rows: Vec<Node> = Vec::new();
    for (r, row) in ctx.table.children().iter().enumerate() {
        let mut cells: Vec<Node> = row
            .children()
            .iter()
            .enumerate()
            .map(|(ci, cell)| {
                if grow.contains(&(r, ci)) {
                    let cs = span(schema, cell, "colspan");
                    cell.clone().with_attr("colspan", cs + 1)
                } else {
                    cell.clone()
                }
            })
            .collect();
        if needs_cell.contains(&r) {
            let idx = row
                .children()
                .iter()
                .enumerate()
                .filter(|(ci, _)| map.lefts.get(&(r, *ci)).is_some_and(|l| *l < at))
                .count();
            cells.insert(idx, empty_cell());
        }
        rows.push(rebuild_row(cells));
    }
    swap_table(state, ctx.table_pos, rows)
}

/// Deletes the row holding the selected cell. Deleting the only row
/// removes the table. Cells spanning into the row shrink; cells anchored
/// in it that span further down are re-homed into the next row.
pub fn delete_row(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let schema = &state.schema;
    if ctx.table.child_count() <= 1 {
        return delete_table(state, &ctx);
    }
    let map = TableMap::build(schema, ctx.table);
    let del = ctx.row_index;

    let mut rehomed: Vec<(usize, Node)> = Vec::new();
    for (ci, cell) in ctx.table.child(del)?.children().iter().enumerate() {
        let rs = span(schema, cell, "rowspan");
        if rs > 1 {
            let left = *map.lefts.get(&(del, ci))?;
            rehomed.push((left, cell.clone().with_attr("rowspan", rs - 1)));
        }
    }

    let mut rows: Vec<Node> = Vec::new();
    for (r, row) in ctx.table.children().iter().enumerate() {
        if r == del {
            continue;
        }
        let mut placed: Vec<(usize, Node)> = Vec::new();
        for (ci, cell) in row.children().iter().enumerate() {
            let left = map.lefts.get(&(r, ci)).copied().unwrap_or(0);
            let rs = span(schema, cell, "rowspan");
            // cells above the deleted row that span across it shrink
            let cell = if r < del && r + rs as usize > del {
                cell.clone().with_attr("rowspan", rs - 1)
            } else {
                cell.clone()
            };
            placed.push((left, cell));
        }
        if r == del + 1 {
            placed.append(&mut rehomed);
            placed.sort_by_key(|(left, _)| *left);
        }
        rows.push(rebuild_row(placed.into_iter().map(|(_, c)| c).collect()));
    }
    swap_table(state, ctx.table_pos, rows)
}

/// Deletes the column holding the selected cell. Deleting the only column
/// removes the table. Cells spanning the column shrink by one.
pub fn delete_column(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let schema = &state.schema;
    let map = TableMap::build(schema, ctx.table);
    if map.cols <= 1 {
        return delete_table(state, &ctx);
    }
    let del = *map.lefts.get(&(ctx.row_index, ctx.cell_index))?;

    let mut shrink: HashSet<(usize, usize)> = HashSet::new();
    let mut remove: HashSet<(usize, usize)> = HashSet::new();
    for r in 0..map.rows {
        if let Some(owner) = map.owner_at(r, del) {
            let cell = ctx.table.child(owner.0)?.child(owner.1)?;
            if span(schema, cell, "colspan") > 1 {
                shrink.insert(owner);
            } else {
                remove.insert(owner);
            }
        }
    }

    let mut rows: Vec<Node> = Vec::new();
    for (r, row) in ctx.table.children().iter().enumerate() {
        let mut cells: Vec<Node> = Vec::new();
        for (ci, cell) in row.children().iter().enumerate() {
            if remove.contains(&(r, ci)) {
                continue;
            }
            if shrink.contains(&(r, ci)) {
                let cs = span(schema, cell, "colspan");
                cells.push(cell.clone().with_attr("colspan", cs - 1));
            } else {
                cells.push(cell.clone());
            }
        }
        rows.push(rebuild_row(cells));
    }
    swap_table(state, ctx.table_pos, rows)
}

fn delete_table(state: &EditorState, ctx: &CellCtx<'_>) -> Option<Transaction> {
    let tr = Transaction::new()
        .step(Step::ReplaceRange {
            from: ctx.table_pos,
            to: ctx.table_pos + ctx.table.node_size(),
            content: Vec::new(),
        })
        .with_selection(Selection::caret(ctx.table_pos + 1));
    validated(state, tr)
}

/// Merges the cells of a cell selection into the rectangle they span.
/// The merge only applies when every cell in the rectangle lies entirely
/// inside it; the merged cell keeps the blocks of all its parts, dropping
/// placeholder empty paragraphs.
pub fn merge_cells(state: &EditorState) -> Option<Transaction> {
    let (anchor, head) = match &state.selection {
        Selection::Cell { anchor, head } => (*anchor, *head),
        Selection::Text { .. } => return None,
    };
    let a = selected_cell(state, anchor)?;
    let b = selected_cell(state, head)?;
    if a.table_pos != b.table_pos
        || (a.row_index, a.cell_index) == (b.row_index, b.cell_index)
    {
        return None;
    }
    let schema = &state.schema;
    let map = TableMap::build(schema, a.table);
    let ea = cell_extent(schema, a.table, &map, (a.row_index, a.cell_index))?;
    let eb = cell_extent(schema, a.table, &map, (b.row_index, b.cell_index))?;
    let rect = Rect {
        top: ea.top.min(eb.top),
        left: ea.left.min(eb.left),
        bottom: ea.bottom.max(eb.bottom),
        right: ea.right.max(eb.right),
    };
    let owners = owners_in(&map, rect)?;
    for &owner in &owners {
        let e = cell_extent(schema, a.table, &map, owner)?;
        if e.top < rect.top || e.left < rect.left || e.bottom > rect.bottom || e.right > rect.right
        {
            return None;
        }
    }

    let mut content: Vec<Node> = Vec::new();
    for &(r, ci) in &owners {
        for block in a.table.child(r)?.child(ci)?.children() {
            let placeholder =
                block.node_type() == NodeType::Paragraph && block.child_count() == 0;
            if !placeholder {
                content.push(block.clone());
            }
        }
    }
    if content.is_empty() {
        content.push(Node::element(NodeType::Paragraph));
    }

    let first = a.table.child(owners[0].0)?.child(owners[0].1)?;
    let mut merged = Node::element(first.node_type());
    if let Some(attrs) = first.attrs() {
        for (name, value) in attrs.iter() {
            if name != "colspan" && name != "rowspan" {
                merged = merged.with_attr(name, value.clone());
            }
        }
    }
    if rect.right - rect.left > 1 {
        merged = merged.with_attr("colspan", (rect.right - rect.left) as i64);
    }
    if rect.bottom - rect.top > 1 {
        merged = merged.with_attr("rowspan", (rect.bottom - rect.top) as i64);
    }
    let merged = merged.with_children(content);

    let caret = cell_start(a.table, a.table_pos, owners[0].0, owners[0].1)? + 2;
    let removed: HashSet<(usize, usize)> = owners[1..].iter().copied().collect();
    let mut rows: Vec<Node> = Vec::new();
    for (r, row) in a.table.children().iter().enumerate() {
        let mut cells: Vec<Node> = Vec::new();
        for (ci, cell) in row.children().iter().enumerate() {
            if (r, ci) == owners[0] {
                cells.push(merged.clone());
            } else if !removed.contains(&(r, ci)) {
                cells.push(cell.clone());
            }
        }
        rows.push(rebuild_row(cells));
    }
    let table = Node::element(NodeType::Table).with_children(rows);
    let tr = Transaction::new()
        .step(Step::ReplaceNode {
            pos: a.table_pos,
            node: table,
        })
        .with_selection(Selection::caret(caret));
    validated(state, tr)
}

/// Splits a spanning cell back into unit cells. The original keeps its
/// content; the freed slots are filled with empty cells of the same kind.
pub fn split_cell(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let schema = &state.schema;
    let cell = ctx.table.child(ctx.row_index)?.child(ctx.cell_index)?;
    let cs = span(schema, cell, "colspan") as usize;
    let rs = span(schema, cell, "rowspan") as usize;
    if cs <= 1 && rs <= 1 {
        return None;
    }
    let map = TableMap::build(schema, ctx.table);
    let left = *map.lefts.get(&(ctx.row_index, ctx.cell_index))?;
    let blank = || {
        Node::element(cell.node_type()).with_child(Node::element(NodeType::Paragraph))
    };

    let mut rows: Vec<Node> = Vec::new();
    for (r, row) in ctx.table.children().iter().enumerate() {
        let mut cells: Vec<Node> = Vec::new();
        for (ci, c) in row.children().iter().enumerate() {
            if (r, ci) == (ctx.row_index, ctx.cell_index) {
                cells.push(c.clone().with_attr("colspan", 1).with_attr("rowspan", 1));
                for _ in 1..cs {
                    cells.push(blank());
                }
            } else {
                cells.push(c.clone());
            }
        }
        if r > ctx.row_index && r < ctx.row_index + rs {
            let idx = row
                .children()
                .iter()
                .enumerate()
                .filter(|(ci, _)| map.lefts.get(&(r, *ci)).is_some_and(|l| *l < left))
                .count();
            for k in 0..cs {
                cells.insert(idx + k, blank());
            }
        }
        rows.push(rebuild_row(cells));
    }
    swap_table(state, ctx.table_pos, rows)
}

/// Toggles the selected cells between `td` and `th`. A mixed selection
/// becomes all headers; an all-header selection becomes all plain cells.
pub fn toggle_header_cell(state: &EditorState) -> Option<Transaction> {
    let ctx = selected_cell(state, state.selection.start())?;
    let schema = &state.schema;
    let map = TableMap::build(schema, ctx.table);
    let targets: Vec<(usize, usize)> = match &state.selection {
        Selection::Text { .. } => vec![(ctx.row_index, ctx.cell_index)],
        Selection::Cell { anchor, head } => {
            let a = selected_cell(state, *anchor)?;
            let b = selected_cell(state, *head)?;
            if a.table_pos != b.table_pos {
                return None;
            }
            let ea = cell_extent(schema, ctx.table, &map, (a.row_index, a.cell_index))?;
            let eb = cell_extent(schema, ctx.table, &map, (b.row_index, b.cell_index))?;
            owners_in(
                &map,
                Rect {
                    top: ea.top.min(eb.top),
                    left: ea.left.min(eb.left),
                    bottom: ea.bottom.max(eb.bottom),
                    right: ea.right.max(eb.right),
                },
            )?
        }
    };
    let all_headers = targets.iter().all(|&(r, ci)| {
        ctx.table
            .child(r)
            .and_then(|row| row.child(ci))
            .is_some_and(|c| c.node_type() == NodeType::TableHeader)
    });
    let to = if all_headers {
        NodeType::TableCell
    } else {
        NodeType::TableHeader
    };

    let chosen: HashSet<(usize, usize)> = targets.into_iter().collect();
    let mut rows: Vec<Node> = Vec::new();
    for (r, row) in ctx.table.children().iter().enumerate() {
        let cells = row
            .children()
            .iter()
            .enumerate()
            .map(|(ci, cell)| {
                if chosen.contains(&(r, ci)) && cell.node_type() != to {
                    let mut out = Node::element(to);
                    if let Some(attrs) = cell.attrs() {
                        for (name, value) in attrs.iter() {
                            out = out.with_attr(name, value.clone());
                        }
                    }
                    out.with_children(cell.children().to_vec())
                } else {
                    cell.clone()
                }
            })
            .collect();
        rows.push(rebuild_row(cells));
    }
    swap_table(state, ctx.table_pos, rows)
}
