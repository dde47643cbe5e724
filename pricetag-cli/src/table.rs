use std::{borrow::Cow, fmt::Display, io};

use console::{pad_str, style, Alignment, Term};

use crate::args::{CustomerColumn, TagColumn};

pub struct ColumnBehavior {
    pub size: usize,
    pub grow: bool,
    pub min_size: usize,
}

impl TagColumn {
    pub fn behavior(&self) -> ColumnBehavior {
        match self {
            TagColumn::Id => ColumnBehavior {
                size: 36,
                grow: false,
                min_size: 8,
            },
            TagColumn::FullTag => ColumnBehavior {
                size: 36,
                grow: false,
                min_size: 16,
            },
            TagColumn::Description => ColumnBehavior {
                size: 32,
                grow: true,
                min_size: 12,
            },
            TagColumn::Color => ColumnBehavior {
                size: 8,
                grow: false,
                min_size: 8,
            },
            TagColumn::Active => ColumnBehavior {
                size: 6,
                grow: false,
                min_size: 6,
            },
            TagColumn::Customers => ColumnBehavior {
                size: 9,
                grow: false,
                min_size: 9,
            },
        }
    }
}

impl CustomerColumn {
    pub fn behavior(&self) -> ColumnBehavior {
        match self {
            CustomerColumn::Id => ColumnBehavior {
                size: 36,
                grow: false,
                min_size: 8,
            },
            CustomerColumn::Name => ColumnBehavior {
                size: 24,
                grow: false,
                min_size: 12,
            },
            CustomerColumn::Tags => ColumnBehavior {
                size: 48,
                grow: true,
                min_size: 24,
            },
            CustomerColumn::Addresses => ColumnBehavior {
                size: 9,
                grow: false,
                min_size: 9,
            },
        }
    }
}

/// Distributes `width` over the columns: shrinks the widest columns first
/// down to their minimum, or hands spare space to growing columns.
fn fit_widths(columns: &[ColumnBehavior], width: usize) -> Vec<usize> {
    let mut sizes: Vec<usize> = columns.iter().map(|column| column.size).collect();

    let separators = columns.len().saturating_sub(1);
    let width = width.max(columns.len() * 3 + separators);
    let total = sizes.iter().sum::<usize>() + separators;

    if total > width {
        let mut excess = total - width;

        while excess > 0 {
            let Some((index, _)) = sizes
                .iter()
                .enumerate()
                .filter(|(index, size)| **size > columns[*index].min_size)
                .max_by_key(|(_, size)| **size)
            else {
                break;
            };

            sizes[index] -= 1;
            excess -= 1;
        }
    } else {
        let growing: Vec<usize> = (0..columns.len()).filter(|i| columns[*i].grow).collect();

        if !growing.is_empty() {
            let spare = width - total;

            for (position, index) in growing.iter().enumerate() {
                sizes[*index] += spare / growing.len() + usize::from(position < spare % growing.len());
            }
        }
    }

    sizes
}

pub struct Table<'t> {
    column_widths: Vec<usize>,
    term: &'t Term,
    current_column: usize,
}

impl<'t> Table<'t> {
    pub fn new(term: &'t Term, columns: Vec<ColumnBehavior>) -> Self {
        let width = term.size().1 as usize;

        Self {
            column_widths: fit_widths(&columns, width),
            term,
            current_column: 0,
        }
    }

    pub fn push_header<T: Display>(&mut self, names: impl IntoIterator<Item = T>) -> io::Result<()> {
        for name in names {
            self.push_cell(style(name).bold())?;
        }

        Ok(())
    }

    pub fn push_cell(&mut self, item: impl Display) -> io::Result<()> {
        let text = item.to_string().replace('\n', " ");

        let width = self.column_widths[self.current_column];
        let last = self.current_column + 1 == self.column_widths.len();

        let cell = if self.term.is_term() {
            pad_str(&text, width, Alignment::Left, Some("..."))
        } else {
            Cow::Borrowed(text.as_str())
        };

        if last {
            self.term.write_line(cell.trim_end())?;
        } else {
            self.term.write_str(&cell)?;
            self.term.write_str(" ")?;
        }

        self.current_column = (self.current_column + 1) % self.column_widths.len();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{fit_widths, ColumnBehavior};

    fn column(size: usize, grow: bool, min_size: usize) -> ColumnBehavior {
        ColumnBehavior {
            size,
            grow,
            min_size,
        }
    }

    #[test]
    fn test_shrinks_widest_first() {
        let columns = [column(30, false, 10), column(10, false, 10)];

        assert_eq!(vec![19, 10], fit_widths(&columns, 30));
    }

    #[test]
    fn test_respects_minimum() {
        let columns = [column(30, false, 20), column(10, false, 10)];

        assert_eq!(vec![20, 10], fit_widths(&columns, 5));
    }

    #[test]
    fn test_grows_growing_columns() {
        let columns = [column(10, true, 5), column(10, false, 5), column(10, true, 5)];

        assert_eq!(vec![14, 10, 13], fit_widths(&columns, 39));
    }
}
