use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::symbols::table::SymbolTable;

/// The program wide state every source file worker shares: the symbol arena and, inside it,
/// the parameterisation intern table. Writers take the single lock, so check-then-create
/// sequences run as one critical section.
#[derive(Debug, Default)]
pub struct Program {
    table: RwLock<SymbolTable>,
}

impl Program {
    pub fn new(table: SymbolTable) -> Self {
        Program { table: RwLock::new(table) }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, SymbolTable> {
        self.table.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, SymbolTable> {
        self.table.write()
    }

    pub fn into_table(self) -> SymbolTable {
        self.table.into_inner()
    }
}
