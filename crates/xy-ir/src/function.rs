//! IR function definitions.

use crate::{Block, BlockId, FuncId, IrType, Linkage, SlotId, TempId};

/// An IR function. External functions carry a signature and no blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct IrFunction {
    /// Function identifier
    pub id: FuncId,

    /// Source-level name; also the symbol name for externals
    pub name: String,

    /// Number of i64 parameters
    pub param_count: usize,

    /// Return type
    pub return_type: IrType,

    pub linkage: Linkage,

    /// Stack slots with the variable name each was allocated for
    pub slots: Vec<(SlotId, String)>,

    /// Number of temporaries allocated so far
    pub temp_count: usize,

    /// Basic blocks comprising the function body
    pub blocks: Vec<Block>,

    /// Entry block (first block to execute)
    pub entry_block: BlockId,
}

impl IrFunction {
    pub fn new(id: FuncId, name: String, param_count: usize, return_type: IrType, linkage: Linkage) -> Self {
        IrFunction {
            id,
            name,
            param_count,
            return_type,
            linkage,
            slots: Vec::new(),
            temp_count: 0,
            blocks: Vec::new(),
            entry_block: BlockId(0),
        }
    }

    pub fn is_external(&self) -> bool {
        self.linkage == Linkage::External
    }

    /// Adds a new stack slot for `name`. Names need not be unique.
    pub fn add_slot(&mut self, name: &str) -> SlotId {
        let id = SlotId(self.slots.len());
        self.slots.push((id, name.to_string()));
        id
    }

    /// Adds a new temporary value.
    pub fn add_temp(&mut self) -> TempId {
        let id = TempId(self.temp_count);
        self.temp_count += 1;
        id
    }

    /// Creates a new basic block.
    pub fn new_block(&mut self, label: &str) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block::new(id, label));
        id
    }

    /// Gets a mutable reference to a block.
    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }

    /// Gets an immutable reference to a block.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    pub fn slot_name(&self, slot: SlotId) -> Option<&str> {
        self.slots.get(slot.0).map(|(_, name)| name.as_str())
    }
}
